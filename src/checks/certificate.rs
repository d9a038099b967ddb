use anyhow::Result;
use preflight::{ApiResult, Check, CheckOutput, RunContext, ids};
use topology::{CertMetadata, Role};

/// Verifies certificate metadata for every configured node.
///
/// Placeholder entries pass: the deploy tool generates their certificates.
/// Entries with only part of a key pair fail.
pub struct CertificateCheck;

fn inspect(cert: Option<&CertMetadata>) -> std::result::Result<&'static str, &'static str> {
    match cert {
        None => Err("no certificate entry"),
        Some(c) if c.is_placeholder() => Ok("certificates will be generated on deploy"),
        Some(c) if c.public_key.is_some() != c.private_key.is_some() => {
            Err("certificate entry has only half of a key pair")
        }
        Some(_) => Ok("custom certificate configured"),
    }
}

impl Check for CertificateCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let mut output = CheckOutput::new();
        for role in Role::ALL {
            let group = ctx.topology.group(role);
            for address in &group.addresses {
                if output.contains_key(address) {
                    continue;
                }
                let result = match inspect(group.certs_by_address.get(address)) {
                    Ok(message) => ApiResult::pass(ids::CERTIFICATE, message),
                    Err(message) => ApiResult::fail(
                        ids::CERTIFICATE,
                        format!("{} node {address}: {message}", role.display_name()),
                    ),
                };
                output.insert(address.clone(), result);
            }
        }
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "Certificate metadata per node"
    }
}
