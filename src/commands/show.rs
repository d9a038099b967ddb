use anyhow::Result;
use topology::{Role, TopologyStore, store};

use crate::Context;
use crate::app::App;
use crate::cli::ShowArgs;
use crate::ui;

pub fn run(ctx: &Context, args: ShowArgs) -> Result<()> {
    let app = App::new(ctx)?;

    if !app.store.exists() {
        ui::warn(&format!("No topology found at {}", app.store.location()));
        ui::dim("Set ha_dir in settings.toml or pass --ha-dir");
        return Ok(());
    }

    let topology = app.load_topology()?;

    if args.raw {
        print!("{}", store::render(&topology)?);
        return Ok(());
    }

    ui::header("Cluster Topology");
    ui::kv("Document", &app.topology_path().display().to_string());
    ui::kv("Deployment mode", &format!("{:?}", topology.deployment_mode));
    ui::kv("External database", &format!("{:?}", topology.external_database));

    for role in Role::ALL {
        let group = topology.group(role);
        ui::section(&format!("{} ({})", role.display_name(), group.instance_count));
        if group.addresses.is_empty() {
            ui::dim("no nodes");
            continue;
        }
        for address in &group.addresses {
            let cert = match group.certs_by_address.get(address) {
                Some(c) if c.is_placeholder() => "generated certificate",
                Some(_) => "custom certificate",
                None => "no certificate entry",
            };
            ui::kv(address, cert);
        }
    }

    if topology.is_data_tier_frozen() {
        println!();
        ui::info("Search and Database nodes are managed by the external database");
    }
    Ok(())
}
