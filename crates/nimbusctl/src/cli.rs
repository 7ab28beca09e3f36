//! CLI structure and command definitions
//!
//! Defines the command-line interface using clap with a three-layer architecture:
//! 1. Raw API access (`api` commands)
//! 2. Resource commands (`vm`, `volume-group`, `image`, `subnet`, `cluster`)
//! 3. Task orchestration (`task` commands and `--wait` on mutations)

use clap::{Args, Parser, Subcommand};
use nimbusctl_core::DialectKind;
use std::path::PathBuf;

/// Nimbus HCI management CLI
#[derive(Parser, Debug)]
#[command(name = "nimbusctl")]
#[command(version, about = "CLI for Nimbus HCI clusters")]
#[command(long_about = "
CLI for Nimbus HCI clusters

Every mutating call returns a task; pass --wait to follow it to
completion, or watch it later:
    nimbusctl vm create web-01 --vcpus 2 --memory-mb 4096 --wait
    nimbusctl task watch 6a3f9c2e-8d41-4b7a-9f1e-5c2d8e7f0a91

EXAMPLES:
    # Set up a profile against a single cluster
    nimbusctl profile set prod --endpoint https://prism.example.com:9440 --username admin

    # Or against a gateway that fans out to managed clusters
    nimbusctl profile set fleet --endpoint https://central.example.com:9440 \\
        --username admin --dialect proxied --cluster-uuid 0005a2b4-...

    # Get JSON output for scripting
    nimbusctl vm list -o json

    # Filter output with JMESPath
    nimbusctl vm list -o json -q \"[?power_state=='on'].name\"

    # Direct API access
    nimbusctl api get /vms

For more help on a specific command, run:
    nimbusctl <command> --help
")]
pub struct Cli {
    /// Profile to use for this command
    #[arg(long, short, global = true, env = "NIMBUSCTL_PROFILE")]
    pub profile: Option<String>,

    /// Path to alternate configuration file
    #[arg(long, global = true, env = "NIMBUSCTL_CONFIG_FILE")]
    pub config_file: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value = "auto")]
    pub output: OutputFormat,

    /// JMESPath query to filter output
    #[arg(long, short = 'q', global = true)]
    pub query: Option<String>,

    /// Enable verbose logging
    #[arg(long, short, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Automatically choose format based on command and context
    Auto,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Human-readable table format
    Table,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Virtual machine operations
    #[command(subcommand)]
    Vm(VmCommands),

    /// Volume group operations
    #[command(subcommand, name = "volume-group", visible_alias = "vg")]
    VolumeGroup(VolumeGroupCommands),

    /// Image catalog operations
    #[command(subcommand, visible_alias = "img")]
    Image(ImageCommands),

    /// Subnet operations
    #[command(subcommand)]
    Subnet(SubnetCommands),

    /// Cluster information
    #[command(subcommand)]
    Cluster(ClusterCommands),

    /// Task inspection and waiting
    #[command(subcommand)]
    Task(TaskCommands),

    /// Profile management
    #[command(subcommand, visible_alias = "prof")]
    #[command(after_help = "EXAMPLES:
    # Create a profile for a directly managed cluster
    nimbusctl profile set prod --endpoint https://prism.example.com:9440 --username admin

    # Create a profile that goes through a central gateway
    nimbusctl profile set fleet --endpoint https://central.example.com:9440 \\
        --username admin --dialect proxied --cluster-uuid 0005a2b4-89fa-4be3-a1c2-0de7f3c8a9b1

    # Allow self-signed certificates in a lab
    nimbusctl profile set lab --endpoint https://10.0.0.5:9440 --username admin --insecure

    # List all profiles and pick a default
    nimbusctl profile list
    nimbusctl profile default prod
")]
    Profile(ProfileCommands),

    /// Raw API access - direct REST endpoint calls
    #[command(name = "api")]
    #[command(after_help = "EXAMPLES:
    # GET request (the /v2 prefix is added when missing)
    nimbusctl api get /vms
    nimbusctl api get /tasks/6a3f9c2e-8d41-4b7a-9f1e-5c2d8e7f0a91

    # POST request with JSON data
    nimbusctl api post /subnets --data '{\"name\":\"dmz\",\"vlan_id\":42}'

    # POST request from file
    nimbusctl api post /vms --data @vm.json

    # Output as JSON for scripting
    nimbusctl api get /images -o json
")]
    Api {
        /// HTTP method
        #[arg(value_parser = parse_http_method)]
        method: HttpMethod,

        /// API endpoint path (e.g., /vms)
        path: String,

        /// Request body (JSON string or @file)
        #[arg(long)]
        data: Option<String>,
    },

    /// Version information
    #[command(visible_alias = "ver")]
    Version,

    /// Generate shell completions
    #[command(visible_alias = "comp")]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bourne Again Shell
    Bash,
    /// Z Shell
    Zsh,
    /// Friendly Interactive Shell
    Fish,
    /// PowerShell
    #[value(name = "powershell", alias = "power-shell")]
    PowerShell,
    /// Elvish
    Elvish,
}

/// HTTP methods for raw API access
#[derive(Debug, Clone)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Parse HTTP method case-insensitively
fn parse_http_method(s: &str) -> Result<HttpMethod, String> {
    match s.to_lowercase().as_str() {
        "get" => Ok(HttpMethod::Get),
        "post" => Ok(HttpMethod::Post),
        "put" => Ok(HttpMethod::Put),
        "delete" => Ok(HttpMethod::Delete),
        _ => Err(format!(
            "invalid HTTP method: {} (valid: get, post, put, delete)",
            s
        )),
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Common arguments for commands that submit a task
#[derive(Args, Debug, Clone)]
pub struct AsyncOperationArgs {
    /// Wait for the task to complete
    #[arg(long)]
    pub wait: bool,

    /// Maximum time to wait in seconds
    #[arg(long, default_value = "600", requires = "wait")]
    pub wait_timeout: u64,

    /// Upper bound on the randomized pause between polls, in seconds
    #[arg(long, default_value = "5", requires = "wait")]
    pub poll_ceiling: u64,
}

/// Power state argument for `vm power`
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PowerAction {
    On,
    Off,
}

impl std::fmt::Display for PowerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerAction::On => write!(f, "on"),
            PowerAction::Off => write!(f, "off"),
        }
    }
}

/// Virtual machine commands
#[derive(Subcommand, Debug)]
pub enum VmCommands {
    /// List virtual machines
    #[command(visible_alias = "ls")]
    List {
        /// Bypass the session cache and refetch from the API
        #[arg(long)]
        refresh: bool,
    },

    /// Show details of a virtual machine
    #[command(visible_alias = "show")]
    Get {
        /// VM uuid or name
        vm: String,
    },

    /// Create a virtual machine
    #[command(after_help = "EXAMPLES:
    # Minimal vm, fire and forget
    nimbusctl vm create web-01 --vcpus 2 --memory-mb 4096

    # Boot disk from an image, a nic, and wait for completion
    nimbusctl vm create web-01 --vcpus 2 --memory-mb 4096 \\
        --image ubuntu-22.04 --subnet prod-net --wait

    # Full provisioning: volume groups attached and powered on
    nimbusctl vm create db-01 --vcpus 8 --memory-mb 32768 \\
        --image ubuntu-22.04 --subnet prod-net \\
        --volume-group db-data --volume-group db-logs \\
        --power-on --wait
")]
    Create {
        /// VM name
        name: String,

        /// Number of virtual CPUs
        #[arg(long, default_value = "1")]
        vcpus: u32,

        /// Memory in MiB
        #[arg(long, default_value = "1024")]
        memory_mb: u64,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,

        /// Image (uuid or name) to clone the boot disk from
        #[arg(long)]
        image: Option<String>,

        /// Size of an additional blank disk in MiB
        #[arg(long)]
        disk_size_mb: Option<u64>,

        /// Subnet (uuid or name) for the first nic
        #[arg(long)]
        subnet: Option<String>,

        /// Static IP for the first nic
        #[arg(long, requires = "subnet")]
        ip: Option<String>,

        /// Volume group (uuid or name) to attach after creation; may be
        /// repeated. Requires --wait.
        #[arg(long = "volume-group")]
        volume_groups: Vec<String>,

        /// Power the vm on after creation. Requires --wait.
        #[arg(long)]
        power_on: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete a virtual machine
    #[command(visible_alias = "rm")]
    Delete {
        /// VM uuid or name
        vm: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Clone a virtual machine
    Clone {
        /// Source VM uuid or name
        source: String,

        /// Name for the clone
        #[arg(long)]
        name: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Power a virtual machine on or off
    Power {
        /// VM uuid or name
        vm: String,

        /// Desired power state
        #[arg(value_enum)]
        state: PowerAction,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Attach a disk to a virtual machine
    #[command(name = "attach-disk")]
    AttachDisk {
        /// VM uuid or name
        vm: String,

        /// Size of a blank disk in MiB
        #[arg(long, required_unless_present = "image", conflicts_with = "image")]
        size_mb: Option<u64>,

        /// Image (uuid or name) to clone the disk from
        #[arg(long)]
        image: Option<String>,

        /// Storage container to place the disk in
        #[arg(long)]
        storage_container: Option<String>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Attach a network interface to a virtual machine
    #[command(name = "attach-nic")]
    AttachNic {
        /// VM uuid or name
        vm: String,

        /// Subnet (uuid or name) to join
        #[arg(long)]
        subnet: String,

        /// Static IP address
        #[arg(long)]
        ip: Option<String>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },
}

/// Volume group commands
#[derive(Subcommand, Debug)]
pub enum VolumeGroupCommands {
    /// List volume groups
    #[command(visible_alias = "ls")]
    List {
        /// Bypass the session cache and refetch from the API
        #[arg(long)]
        refresh: bool,
    },

    /// Show details of a volume group
    #[command(visible_alias = "show")]
    Get {
        /// Volume group uuid or name
        volume_group: String,
    },

    /// Create a volume group
    Create {
        /// Volume group name
        name: String,

        /// Free-form description
        #[arg(long)]
        description: Option<String>,

        /// Size of a disk in MiB; may be repeated for multiple disks
        #[arg(long = "disk-size-mb")]
        disk_sizes_mb: Vec<u64>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete a volume group
    #[command(visible_alias = "rm")]
    Delete {
        /// Volume group uuid or name
        volume_group: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Attach a volume group to a vm
    Attach {
        /// Volume group uuid or name
        volume_group: String,

        /// VM uuid or name
        #[arg(long)]
        vm: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Detach a volume group from a vm
    Detach {
        /// Volume group uuid or name
        volume_group: String,

        /// VM uuid or name
        #[arg(long)]
        vm: String,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },
}

/// Image catalog commands
#[derive(Subcommand, Debug)]
pub enum ImageCommands {
    /// List images
    #[command(visible_alias = "ls")]
    List {
        /// Bypass the session cache and refetch from the API
        #[arg(long)]
        refresh: bool,
    },

    /// Show details of an image
    #[command(visible_alias = "show")]
    Get {
        /// Image uuid or name
        image: String,
    },

    /// Create an image catalog entry
    #[command(after_help = "EXAMPLES:
    # Let the backend fetch the content itself
    nimbusctl image create ubuntu-22.04 --source-uri https://mirror/jammy.qcow2 --wait

    # Create the entry now, push the bits later
    nimbusctl image create rescue-iso --image-type ISO_IMAGE
    nimbusctl image upload rescue-iso ./rescue.iso --wait
")]
    Create {
        /// Image name
        name: String,

        /// URL the backend should fetch the image content from
        #[arg(long)]
        source_uri: Option<String>,

        /// DISK_IMAGE or ISO_IMAGE
        #[arg(long)]
        image_type: Option<String>,

        /// Free-form annotation
        #[arg(long)]
        annotation: Option<String>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Upload image content from a local file
    Upload {
        /// Image uuid or name
        image: String,

        /// Path to the file to upload
        file: PathBuf,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete an image
    #[command(visible_alias = "rm")]
    Delete {
        /// Image uuid or name
        image: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },
}

/// Subnet commands
#[derive(Subcommand, Debug)]
pub enum SubnetCommands {
    /// List subnets
    #[command(visible_alias = "ls")]
    List {
        /// Bypass the session cache and refetch from the API
        #[arg(long)]
        refresh: bool,
    },

    /// Show details of a subnet
    #[command(visible_alias = "show")]
    Get {
        /// Subnet uuid or name
        subnet: String,
    },

    /// Create a subnet
    Create {
        /// Subnet name
        name: String,

        /// VLAN id
        #[arg(long)]
        vlan_id: Option<u32>,

        /// Network address, e.g. 10.20.0.0
        #[arg(long)]
        network_address: Option<String>,

        /// Prefix length, e.g. 24
        #[arg(long, requires = "network_address")]
        prefix_length: Option<u8>,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },

    /// Delete a subnet
    #[command(visible_alias = "rm")]
    Delete {
        /// Subnet uuid or name
        subnet: String,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        force: bool,

        #[command(flatten)]
        async_ops: AsyncOperationArgs,
    },
}

/// Cluster commands
#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// List reachable clusters
    #[command(visible_alias = "ls")]
    List {
        /// Bypass the session cache and refetch from the API
        #[arg(long)]
        refresh: bool,
    },

    /// Show details of a cluster
    #[command(visible_alias = "show")]
    Get {
        /// Cluster uuid
        uuid: String,
    },
}

/// Task commands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Fetch the raw state of a task
    #[command(visible_alias = "show")]
    Get {
        /// Task uuid
        task_uuid: String,
    },

    /// Watch one or more tasks until they reach a terminal state
    #[command(after_help = "EXAMPLES:
    # Follow a single task with a spinner
    nimbusctl task watch 6a3f9c2e-8d41-4b7a-9f1e-5c2d8e7f0a91

    # Watch several tasks concurrently and print all outcomes
    nimbusctl task watch 6a3f9c2e-... 91c4e7d0-... -o json

    # Give up after two minutes
    nimbusctl task watch 6a3f9c2e-... --wait-timeout 120
")]
    Watch {
        /// Task uuids to watch
        #[arg(required = true)]
        task_uuids: Vec<String>,

        /// Maximum time to wait in seconds
        #[arg(long, default_value = "600")]
        wait_timeout: u64,

        /// Upper bound on the randomized pause between polls, in seconds
        #[arg(long, default_value = "5")]
        poll_ceiling: u64,
    },
}

/// Profile management commands
#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all configured profiles
    #[command(visible_alias = "ls")]
    List,

    /// Show the path to the configuration file
    Path,

    /// Show details of a specific profile
    #[command(visible_alias = "sh")]
    Show {
        /// Profile name to show
        name: String,
    },

    /// Set or create a profile
    #[command(visible_alias = "add", visible_alias = "create")]
    Set {
        /// Profile name
        name: String,

        /// Base URL of the management API, e.g. https://host:9440
        #[arg(long)]
        endpoint: String,

        /// Username for API authentication
        #[arg(long)]
        username: String,

        /// Password; omit to be prompted at connection time
        #[arg(long)]
        password: Option<String>,

        /// How the endpoint reports task status
        #[arg(long, value_enum, default_value = "direct")]
        dialect: DialectKind,

        /// Cluster the gateway should route to (proxied dialect only)
        #[arg(long, required_if_eq("dialect", "proxied"))]
        cluster_uuid: Option<String>,

        /// Allow insecure connections (self-signed certificates)
        #[arg(long)]
        insecure: bool,

        /// Path to a custom CA certificate for TLS verification
        #[arg(long)]
        ca_cert: Option<String>,
    },

    /// Remove a profile
    #[command(visible_alias = "rm", visible_alias = "del")]
    Remove {
        /// Profile name to remove
        name: String,
    },

    /// Set the default profile
    Default {
        /// Profile name to set as default
        name: String,
    },
}
