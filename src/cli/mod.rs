use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod render;

#[derive(Parser)]
#[command(name = "wharf")]
#[command(about = "Render and check container-engine API requests")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (default: $XDG_CONFIG_HOME/wharf/config.toml)
    #[arg(short, long, env = "WHARF_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Engine address, e.g. unix:///var/run/docker.sock or tcp://host:2375
    #[arg(long, env = "WHARF_HOST", global = true)]
    pub host: Option<String>,

    /// Engine API version, e.g. 1.41
    #[arg(long, env = "WHARF_API_VERSION", global = true)]
    pub api_version: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render the request for an engine operation without sending it
    Request {
        #[command(subcommand)]
        operation: RequestCommands,
    },

    /// Encode or decode filter expressions
    Filters {
        #[command(subcommand)]
        command: FilterCommands,
    },

    /// Check a detach-key sequence and print the bytes it matches
    DetachKeys {
        /// Sequence such as ctrl-p,ctrl-q
        keys: String,
    },

    /// Health-check helpers
    Health {
        #[command(subcommand)]
        command: HealthCommands,
    },

    /// Registry credential helpers
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Client configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum RequestCommands {
    /// List containers
    Ps {
        /// Show all containers (including stopped)
        #[arg(short, long)]
        all: bool,

        /// Display total file sizes
        #[arg(short, long)]
        size: bool,

        /// Show the n last created containers
        #[arg(short = 'n', long)]
        last: Option<i64>,

        /// Filter output (key=value)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// List images
    Images {
        /// Show intermediate images
        #[arg(short, long)]
        all: bool,

        /// Filter output (key=value)
        #[arg(short, long = "filter")]
        filters: Vec<String>,

        /// Only images matching this reference
        reference: Option<String>,
    },

    /// Create a container
    Create {
        /// Image to create the container from
        image: String,

        /// Container name
        #[arg(long)]
        name: Option<String>,

        /// Environment variables (KEY=value)
        #[arg(short, long)]
        env: Vec<String>,

        /// Labels (key=value)
        #[arg(short, long)]
        label: Vec<String>,

        /// Published ports ([ip:]host:container[/proto])
        #[arg(short, long)]
        publish: Vec<String>,

        /// Restart policy (no, always, unless-stopped, on-failure[:n])
        #[arg(long)]
        restart: Option<String>,

        /// Shell command run as the health check
        #[arg(long)]
        health_cmd: Option<String>,

        /// Consecutive failures before the container is unhealthy
        #[arg(long)]
        health_retries: Option<u32>,

        /// Disable any image-defined health check
        #[arg(long, conflicts_with = "health_cmd")]
        no_healthcheck: bool,

        /// Working directory inside the container
        #[arg(short, long)]
        workdir: Option<String>,

        /// User to run as
        #[arg(short, long)]
        user: Option<String>,

        /// Allocate a pseudo-TTY
        #[arg(short, long)]
        tty: bool,

        /// Command and arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Stop a container
    Stop {
        container: String,

        /// Seconds to wait before killing
        #[arg(short, long)]
        time: Option<i64>,
    },

    /// Kill a container
    Kill {
        container: String,

        /// Signal to send
        #[arg(short, long)]
        signal: Option<String>,
    },

    /// Pull an image
    Pull {
        reference: String,

        /// Pull every tag of the repository
        #[arg(short, long)]
        all_tags: bool,
    },

    /// Push an image
    Push { reference: String },

    /// Search a registry
    Search {
        term: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<i64>,

        /// Filter output (key=value)
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },

    /// Remove a container
    Rm {
        container: String,

        /// Remove a running container
        #[arg(short, long)]
        force: bool,

        /// Remove anonymous volumes
        #[arg(short, long)]
        volumes: bool,

        /// Remove the link instead of the container
        #[arg(short, long)]
        link: bool,
    },

    /// Remove an image
    Rmi {
        image: String,

        /// Remove even if in use
        #[arg(short, long)]
        force: bool,

        /// Keep untagged parents
        #[arg(long)]
        no_prune: bool,
    },

    /// Fetch container logs
    Logs {
        container: String,

        /// Stream new output
        #[arg(short, long)]
        follow: bool,

        /// Prefix lines with timestamps
        #[arg(short, long)]
        timestamps: bool,

        /// Lines from the end (number or "all")
        #[arg(long)]
        tail: Option<String>,

        /// Only logs since this timestamp
        #[arg(long)]
        since: Option<String>,

        /// Leave out stdout
        #[arg(long)]
        no_stdout: bool,

        /// Leave out stderr
        #[arg(long)]
        no_stderr: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum FilterCommands {
    /// Encode key=value pairs into the filters query value
    Encode { pairs: Vec<String> },

    /// Decode a filters query value
    Decode { text: String },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum HealthCommands {
    /// Validate a health-check test, e.g. CMD-SHELL "curl -f localhost"
    Validate {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        test: Vec<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum AuthCommands {
    /// Print the X-Registry-Auth value for a credential
    Encode {
        /// Registry address; stored credentials are used when no secret is given
        #[arg(long, default_value = wharf::registry::DEFAULT_REGISTRY)]
        server: String,

        #[arg(short, long)]
        username: Option<String>,

        #[arg(short, long, env = "WHARF_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[arg(long, env = "WHARF_IDENTITY_TOKEN", hide_env_values = true)]
        identity_token: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigCommands {
    /// Print the effective configuration (secrets redacted)
    Show,

    /// Validate the configuration file
    Validate,

    /// Write a commented configuration template
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_collects_trailing_command() {
        let cli = Cli::try_parse_from([
            "wharf", "request", "create", "--name", "web-1", "-p", "8080:80", "nginx", "nginx", "-g",
            "daemon off;",
        ])
        .unwrap();
        let Commands::Request {
            operation: RequestCommands::Create { name, command, publish, .. },
        } = cli.command
        else {
            panic!("expected create");
        };
        assert_eq!(name.as_deref(), Some("web-1"));
        assert_eq!(publish, vec!["8080:80"]);
        assert_eq!(command, vec!["nginx", "-g", "daemon off;"]);
    }

    #[test]
    fn test_global_host_flag() {
        let cli = Cli::try_parse_from(["wharf", "request", "ps", "--host", "tcp://10.0.0.1:2375"])
            .unwrap();
        assert_eq!(cli.host.as_deref(), Some("tcp://10.0.0.1:2375"));
    }

    #[test]
    fn test_healthcheck_flags_conflict() {
        assert!(
            Cli::try_parse_from([
                "wharf", "request", "create", "--health-cmd", "true", "--no-healthcheck", "nginx",
            ])
            .is_err()
        );
    }
}
