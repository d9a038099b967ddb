use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use topology::{ProposedAddresses, Role};

#[derive(Parser)]
#[command(name = "nodeops")]
#[command(version)]
#[command(about = "Verify and change the membership of a multi-role cluster", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Settings file (default: ~/.config/nodeops/settings.toml)
    #[arg(long, global = true, env = "NODEOPS_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Directory holding the cluster topology (overrides settings)
    #[arg(long, global = true, env = "NODEOPS_HA_DIR")]
    pub ha_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run preflight checks against every node
    Verify(VerifyArgs),

    /// Add or remove cluster nodes
    #[command(subcommand)]
    Node(NodeCommand),

    /// Show the current cluster topology
    Show(ShowArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Comma-separated check identifiers (default: every built-in check)
    #[arg(short, long, value_delimiter = ',')]
    pub checks: Vec<String>,

    /// Print the batch response as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Print the persisted TOML document
    #[arg(long)]
    pub raw: bool,
}

// ============================================================================
// Node Commands
// ============================================================================

#[derive(Subcommand)]
pub enum NodeCommand {
    /// Add nodes to the cluster and deploy
    Add(NodeArgs),

    /// Remove nodes from the cluster and deploy
    Remove(NodeArgs),
}

#[derive(Args)]
pub struct NodeArgs {
    /// Control-plane node IPs (comma-separated)
    #[arg(long = "control-plane", visible_alias = "automate", default_value = "")]
    pub control_plane: String,

    /// Gateway node IPs (comma-separated)
    #[arg(long, visible_alias = "chef-server", default_value = "")]
    pub gateway: String,

    /// Search node IPs (comma-separated)
    #[arg(long, visible_alias = "opensearch", default_value = "")]
    pub search: String,

    /// Database node IPs (comma-separated)
    #[arg(long, visible_alias = "postgresql", default_value = "")]
    pub database: String,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    pub auto_accept: bool,
}

impl NodeArgs {
    /// Collect the per-role address lists
    pub fn proposed(&self) -> ProposedAddresses {
        let mut proposed = ProposedAddresses::new();
        proposed.set_csv(Role::ControlPlane, &self.control_plane);
        proposed.set_csv(Role::Gateway, &self.gateway);
        proposed.set_csv(Role::Search, &self.search);
        proposed.set_csv(Role::Database, &self.database);
        proposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_node_add_parses_roles() {
        let cli = Cli::parse_from([
            "nodeops",
            "node",
            "add",
            "--gateway",
            "10.0.0.7, 10.0.0.8",
            "--opensearch",
            "10.0.0.9",
            "-y",
        ]);
        let Command::Node(NodeCommand::Add(args)) = cli.command else {
            panic!("expected node add");
        };
        assert!(args.auto_accept);
        let proposed = args.proposed();
        assert_eq!(proposed.get(Role::Gateway), ["10.0.0.7", "10.0.0.8"]);
        assert_eq!(proposed.get(Role::Search), ["10.0.0.9"]);
        assert!(proposed.get(Role::ControlPlane).is_empty());
    }

    #[test]
    fn test_verify_check_list() {
        let cli = Cli::parse_from(["nodeops", "-vv", "verify", "--checks", "fqdn,firewall", "--json"]);
        assert_eq!(cli.verbose, 2);
        let Command::Verify(args) = cli.command else {
            panic!("expected verify");
        };
        assert_eq!(args.checks, vec!["fqdn", "firewall"]);
        assert!(args.json);
    }
}
