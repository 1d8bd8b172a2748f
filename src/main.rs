//! Binary entry point for the dropship CLI.

use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use dropship::compute::{Image, NamingConvention, RandomSuffixNaming};
use dropship::domain::{Region, Size};
use dropship::{
    ConfigError, DefaultCredentialsProvisioner, DigitalOceanComputeServiceAdapter,
    DigitalOceanConfig, DigitalOceanError, DigitalOceanImageExtension, HttpTransport,
    NodeMetadata, Template, TemplateOptions,
};

mod cli;

use cli::{Cli, CreateCommand};

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Provider(#[from] DigitalOceanError),
    #[error("failed to read public key file {path}: {message}")]
    KeyFile { path: String, message: String },
    #[error("image {0} was not deleted")]
    ImageNotDeleted(String),
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(()) => 0,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn connect() -> Result<DigitalOceanComputeServiceAdapter, CliError> {
    let config = DigitalOceanConfig::load_without_cli_args()?;
    let transport = HttpTransport::new(&config)?;
    Ok(DigitalOceanComputeServiceAdapter::new(
        Arc::new(transport),
        config.poll_policies(),
    ))
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let adapter = connect()?;
    let mut out = io::stdout();
    match cli {
        Cli::Nodes => write_nodes(&mut out, &adapter.describe_nodes().await?)?,
        Cli::Images => {
            let images = adapter.list_images().await?;
            let portable: Vec<Image> = images
                .iter()
                .map(dropship::compute::transform::to_image)
                .collect();
            write_images(&mut out, &portable)?;
        }
        Cli::Sizes => write_sizes(&mut out, &adapter.list_hardware_profiles().await?)?,
        Cli::Regions => write_regions(&mut out, &adapter.list_locations().await?)?,
        Cli::Create(args) => {
            let public_key = args
                .public_key_file
                .as_deref()
                .map(read_public_key)
                .transpose()?;
            let name = args
                .name
                .clone()
                .unwrap_or_else(|| RandomSuffixNaming.unique_name_for_group(&args.group));
            let template = build_template(&args, public_key);
            let created = adapter
                .create_node_with_group_encoded_into_name(&args.group, &name, &template)
                .await?;
            writeln!(
                out,
                "{}\t{}\t{}",
                created.id, created.node.name, created.node.ip
            )?;
        }
        Cli::Destroy(args) => adapter.destroy_node(&args.id).await?,
        Cli::Reboot(args) => adapter.reboot_node(&args.id).await?,
        Cli::Suspend(args) => adapter.suspend_node(&args.id).await?,
        Cli::Resume(args) => adapter.resume_node(&args.id).await?,
        Cli::CloneImage(args) => {
            let extension = DigitalOceanImageExtension::new(&adapter);
            let image = extension
                .create_image_from_node(&args.name, &args.node)
                .await?;
            write_images(&mut out, &[image])?;
        }
        Cli::DeleteImage(args) => {
            let extension = DigitalOceanImageExtension::new(&adapter);
            if !extension.delete_image(&args.id).await {
                return Err(CliError::ImageNotDeleted(args.id));
            }
        }
        Cli::DefaultCredentials => {
            let provisioner = DefaultCredentialsProvisioner::new(adapter.transport());
            let defaults = provisioner.get().await?;
            writeln!(out, "# key {} ({})", defaults.key.id, defaults.key.name)?;
            writeln!(out, "# user {}", defaults.credentials.user)?;
            if let Some(private_key) = &defaults.credentials.private_key {
                out.write_all(private_key.as_bytes())?;
            }
        }
    }
    Ok(())
}

fn build_template(args: &CreateCommand, public_key: Option<String>) -> Template {
    Template {
        image_id: args.image,
        hardware_id: args.size,
        location_id: args.region,
        options: TemplateOptions {
            public_key,
            ssh_key_ids: args.ssh_key_ids.clone(),
            private_networking: args.private_networking.then_some(true),
            backups_enabled: args.backups.then_some(true),
        },
    }
}

fn read_public_key(path: &str) -> Result<String, CliError> {
    let key_error = |message: String| CliError::KeyFile {
        path: path.to_owned(),
        message,
    };
    let key_path = Utf8Path::new(path);

    let (dir_path, file_path) = if key_path.is_absolute() {
        let parent = key_path
            .parent()
            .ok_or_else(|| key_error(String::from("path has no parent directory")))?;
        let file_name = key_path
            .file_name()
            .ok_or_else(|| key_error(String::from("path has no file name")))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), key_path)
    };

    let dir = Dir::open_ambient_dir(dir_path, ambient_authority())
        .map_err(|err| key_error(err.to_string()))?;
    let contents = dir
        .read_to_string(file_path)
        .map_err(|err| key_error(err.to_string()))?;
    Ok(contents.trim().to_owned())
}

fn optional(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}

fn write_nodes(mut target: impl Write, nodes: &[NodeMetadata]) -> io::Result<()> {
    for node in nodes {
        writeln!(
            target,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            node.id,
            node.name,
            node.status,
            node.public_addresses.join(","),
            optional(node.hardware.as_ref().map(|hw| hw.name.as_str())),
            optional(node.location.as_ref().map(|loc| loc.slug.as_str())),
            optional(node.operating_system.as_ref().map(|os| os.description.as_str())),
        )?;
    }
    Ok(())
}

fn write_images(mut target: impl Write, images: &[Image]) -> io::Result<()> {
    for image in images {
        writeln!(
            target,
            "{}\t{}\t{}\t{}",
            image.id, image.name, image.operating_system.family, image.operating_system.arch
        )?;
    }
    Ok(())
}

fn write_sizes(mut target: impl Write, sizes: &[Size]) -> io::Result<()> {
    for size in sizes {
        writeln!(
            target,
            "{}\t{}\t{} MB\t{} vCPU\t{} GB\t{}/h",
            size.id, size.name, size.memory, size.cpu, size.disk, size.cost_per_hour
        )?;
    }
    Ok(())
}

fn write_regions(mut target: impl Write, regions: &[Region]) -> io::Result<()> {
    for region in regions {
        writeln!(target, "{}\t{}\t{}", region.id, region.slug, region.name)?;
    }
    Ok(())
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "{err}").ok();
}
