use anyhow::Result;
use preflight::{ApiResult, Check, CheckOutput, LOCAL_ADDRESS, RunContext, ids};
use topology::{Role, TopologyDescription};

/// Minimum members per role
fn minimum(role: Role, topology: &TopologyDescription) -> usize {
    match role {
        Role::ControlPlane | Role::Gateway => 1,
        // An external database hosts the data tier
        Role::Search | Role::Database if topology.is_data_tier_frozen() => 0,
        Role::Search | Role::Database => 3,
    }
}

/// Verifies node counts per role and count/address consistency
pub struct HardwareResourceCountCheck;

impl Check for HardwareResourceCountCheck {
    fn run(&self, ctx: &RunContext) -> Result<CheckOutput> {
        let topology = &ctx.topology;
        let mut output = CheckOutput::new();
        let mut shortfalls = Vec::new();

        for role in Role::ALL {
            let group = topology.group(role);
            let min = minimum(role, topology);
            let problem = if let Err(e) = group.check_consistency(role) {
                Some(e.to_string())
            } else if group.addresses.len() < min {
                Some(format!(
                    "{} needs at least {min} node(s), found {}",
                    role.display_name(),
                    group.addresses.len()
                ))
            } else {
                None
            };

            if group.addresses.is_empty() {
                shortfalls.extend(problem);
                continue;
            }

            for address in &group.addresses {
                // First role wins for addresses listed twice
                if output.contains_key(address) {
                    continue;
                }
                let result = match &problem {
                    Some(message) => ApiResult::fail(ids::HARDWARE_RESOURCE_COUNT, message.clone()),
                    None => ApiResult::pass(
                        ids::HARDWARE_RESOURCE_COUNT,
                        format!(
                            "{} has {} of at least {min} node(s)",
                            role.display_name(),
                            group.addresses.len()
                        ),
                    ),
                };
                output.insert(address.clone(), result);
            }
        }

        if !shortfalls.is_empty() {
            output.insert(
                LOCAL_ADDRESS.to_string(),
                ApiResult::fail(ids::HARDWARE_RESOURCE_COUNT, shortfalls.join("; ")),
            );
        }
        Ok(output)
    }

    fn description(&self) -> &'static str {
        "Node count per role"
    }
}
