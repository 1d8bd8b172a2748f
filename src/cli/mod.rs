//! Command-line interface definitions for the `dropship` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::{Args, Parser};

/// Top-level CLI for the `dropship` binary.
#[derive(Debug, Parser)]
#[command(
    name = "dropship",
    about = "Manage DigitalOcean droplets, images, and SSH keys through the v1 API",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// List droplets with their size, region, and operating system.
    #[command(name = "nodes")]
    Nodes,
    /// List the images visible to the account.
    #[command(name = "images")]
    Images,
    /// List the available droplet sizes.
    #[command(name = "sizes")]
    Sizes,
    /// List the available regions.
    #[command(name = "regions")]
    Regions,
    /// Create a droplet and wait until it is running.
    #[command(name = "create")]
    Create(CreateCommand),
    /// Destroy a droplet, scrubbing its disk.
    #[command(name = "destroy")]
    Destroy(NodeCommand),
    /// Reboot a droplet and wait until it is running again.
    #[command(name = "reboot")]
    Reboot(NodeCommand),
    /// Power a droplet off and wait until it is off.
    #[command(name = "suspend")]
    Suspend(NodeCommand),
    /// Power a droplet on and wait until it is running.
    #[command(name = "resume")]
    Resume(NodeCommand),
    /// Snapshot a droplet into a new image.
    #[command(name = "clone-image")]
    CloneImage(CloneImageCommand),
    /// Delete an image.
    #[command(name = "delete-image")]
    DeleteImage(ImageCommand),
    /// Register the default login key pair and print its private half.
    #[command(name = "default-credentials")]
    DefaultCredentials,
}

/// Arguments for `dropship create`.
#[derive(Debug, Args)]
pub(crate) struct CreateCommand {
    /// Group encoded into the droplet name.
    #[arg(long)]
    pub(crate) group: String,
    /// Explicit droplet name; generated from the group when omitted.
    #[arg(long)]
    pub(crate) name: Option<String>,
    /// Image identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) image: i32,
    /// Size identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) size: i32,
    /// Region identifier.
    #[arg(long, value_name = "ID")]
    pub(crate) region: i32,
    /// OpenSSH public key file to register and authorize on the droplet.
    #[arg(long, value_name = "PATH")]
    pub(crate) public_key_file: Option<String>,
    /// Already registered SSH key to authorize; may be repeated.
    #[arg(long = "ssh-key-id", value_name = "ID")]
    pub(crate) ssh_key_ids: Vec<i32>,
    /// Enable private networking.
    #[arg(long)]
    pub(crate) private_networking: bool,
    /// Enable automatic backups.
    #[arg(long)]
    pub(crate) backups: bool,
}

/// Arguments for commands addressing a single droplet.
#[derive(Debug, Args)]
pub(crate) struct NodeCommand {
    /// Droplet identifier.
    pub(crate) id: String,
}

/// Arguments for `dropship clone-image`.
#[derive(Debug, Args)]
pub(crate) struct CloneImageCommand {
    /// Droplet to snapshot.
    #[arg(long, value_name = "ID")]
    pub(crate) node: String,
    /// Name of the new image.
    #[arg(long)]
    pub(crate) name: String,
}

/// Arguments for `dropship delete-image`.
#[derive(Debug, Args)]
pub(crate) struct ImageCommand {
    /// Image identifier.
    pub(crate) id: String,
}
