//! cani2d CLI
//!
//! Command-line interface for exporting scene snapshots to the cani2d format.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};

use cani2d_core::logging::{init_with_config, TracingConfig};
use cani2d_export::{Cani2dExporter, ExportOptions, ExportReport};
use cani2d_scene::{JsonSceneReader, ReadOptions, Scene, SceneReader, Skeleton, UvLayout};

/// cani2d - skinned mesh, skeleton and animation exporter
#[derive(Parser)]
#[command(name = "cani2d")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for reports
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene snapshot to a cani2d document
    Export(ExportArgs),

    /// Show the scene contents and the object that would be exported
    Info(SceneArgs),

    /// Check a scene snapshot without exporting it
    Validate(SceneArgs),
}

#[derive(Args)]
struct ExportArgs {
    /// Path to the scene snapshot (JSON)
    #[arg(short, long)]
    scene: PathBuf,

    /// Output file, or `-` for stdout
    #[arg(short, long)]
    output: PathBuf,

    /// Load export options from a JSON file
    #[arg(long)]
    options: Option<PathBuf>,

    /// Pretty-print the document
    #[arg(long)]
    pretty: bool,

    /// Write bone rest rotations
    #[arg(long)]
    bone_rotation: bool,

    /// Keep authored handle signs on location Y curves
    #[arg(long)]
    legacy_location_handles: bool,
}

#[derive(Args)]
struct SceneArgs {
    /// Path to the scene snapshot (JSON)
    #[arg(short, long)]
    scene: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_config(TracingConfig::from_verbosity(cli.verbose));

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Info(args) => cmd_info(args, cli.format),
        Commands::Validate(args) => cmd_validate(args, cli.format),
    }
}

fn read_scene(path: &Path, validate: bool) -> Result<Scene> {
    let reader = JsonSceneReader::new();
    if !reader.can_read(path) {
        warn!(path = %path.display(), "Unexpected file extension, reading as JSON");
    }

    let scene = reader
        .read_file_with_options(path, &ReadOptions { validate })
        .with_context(|| format!("Failed to read scene {}", path.display()))?;
    debug!(objects = scene.objects.len(), actions = scene.actions.len(), "Scene loaded");
    Ok(scene)
}

fn export_options(args: &ExportArgs) -> Result<ExportOptions> {
    let mut options = match &args.options {
        Some(path) => ExportOptions::from_json_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => ExportOptions::default(),
    };

    if args.pretty {
        options.pretty = true;
    }
    if args.bone_rotation {
        options.emit_bone_rotation = true;
    }
    if args.legacy_location_handles {
        options.mirror_location_handles = false;
    }
    Ok(options)
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    let scene = read_scene(&args.scene, true)?;
    let exporter = Cani2dExporter::with_options(export_options(&args)?);

    let result = if args.output.as_os_str() == "-" {
        exporter.export_to_string(&scene).map(|(text, report)| {
            println!("{}", text);
            report
        })
    } else {
        exporter.export_to_file(&scene, &args.output)
    };

    let report = match result {
        Ok(report) => report,
        Err(err) if err.is_no_exportable_mesh() => {
            bail!("{} (select a mesh object that has a UV layer)", err)
        }
        Err(err) => {
            return Err(anyhow::Error::new(err)
                .context(format!("Failed to export to {}", args.output.display())))
        }
    };
    info!(output = %args.output.display(), "Export complete");

    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }

    // Keep stdout clean for the document itself
    if args.output.as_os_str() != "-" {
        print_report(&report, &args.output, format)?;
    }

    Ok(())
}

fn print_report(report: &ExportReport, output: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "output": output,
                "report": report,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Exported {} -> {:?}", report.object, output);
            println!("  Vertices:       {}", report.vertices);
            println!("  Faces:          {}", report.faces);
            println!("  Vertex groups:  {}", report.vertex_groups);
            println!("  Armature:       {}", report.armature.as_deref().unwrap_or("none"));
            println!("  Bones:          {}", report.bones);
            println!("  Animations:     {}", report.animations);
            if report.has_warnings() {
                println!("  Warnings:       {}", report.warnings.len());
            }
        }
    }
    Ok(())
}

fn cmd_info(args: SceneArgs, format: OutputFormat) -> Result<()> {
    let scene = read_scene(&args.scene, false)?;

    let target = scene.export_target();
    let target_error = target.as_ref().err().map(ToString::to_string);
    let target = target.ok();

    let skeleton = target
        .and_then(|t| t.armature)
        .map(|a| Skeleton::from_armature(a.data))
        .transpose()
        .context("Invalid bone hierarchy")?;
    let bone_names = skeleton.as_ref().map(Skeleton::bone_names).unwrap_or_default();
    let tracks: Vec<(&str, usize, Option<f64>)> = target
        .and_then(|t| t.armature)
        .and_then(|a| a.data.animation_data.as_ref())
        .map(|anim| {
            anim.nla_tracks
                .iter()
                .map(|t| (t.name.as_str(), t.strips.len(), t.length()))
                .collect()
        })
        .unwrap_or_default();

    match format {
        OutputFormat::Json => {
            let objects: Vec<_> = scene
                .objects
                .iter()
                .map(|o| {
                    serde_json::json!({
                        "name": o.name,
                        "type": o.type_name(),
                        "parent": o.parent,
                        "selected": o.selected,
                    })
                })
                .collect();
            let json = serde_json::json!({
                "path": args.scene,
                "objects": objects,
                "actions": scene.actions.iter().map(|a| &a.name).collect::<Vec<_>>(),
                "target": target.map(|t| serde_json::json!({
                    "object": t.object.name,
                    "vertices": t.mesh.vertex_count(),
                    "faces": t.mesh.face_count(),
                    "uv_layer": t.uv_layer.name,
                    "uv_per_corner": t.uv_layout == UvLayout::PerLoop,
                    "vertex_groups": t.mesh.vertex_groups,
                    "armature": t.armature.map(|a| a.object.name.clone()),
                    "bones": bone_names,
                    "tracks": tracks.iter().map(|(name, strips, length)| serde_json::json!({
                        "name": name,
                        "strips": strips,
                        "length": length,
                    })).collect::<Vec<_>>(),
                })),
                "target_error": target_error,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Scene: {:?}", args.scene);
            println!("  Objects:  {}", scene.objects.len());
            for object in &scene.objects {
                let marker = if object.selected { "*" } else { " " };
                println!("   {} {:<24} {}", marker, object.name, object.type_name());
            }
            println!("  Actions:  {}", scene.actions.len());

            match target {
                Some(t) => {
                    println!("\nExport target: {}", t.object.name);
                    println!("  Vertices:       {}", t.mesh.vertex_count());
                    println!("  Faces:          {}", t.mesh.face_count());
                    println!("  UV layer:       {} ({:?})", t.uv_layer.name, t.uv_layout);
                    println!("  Vertex groups:  {}", t.mesh.vertex_groups.len());
                    match t.armature {
                        Some(a) => println!("  Armature:       {} ({} bones)", a.object.name, skeleton.as_ref().map_or(0, Skeleton::bone_count)),
                        None => println!("  Armature:       none"),
                    }
                    for (name, strips, length) in &tracks {
                        match length {
                            Some(length) => println!("  Track {:<16} {} strips, {} frames", name, strips, length),
                            None => println!("  Track {:<16} empty", name),
                        }
                    }
                }
                None => {
                    println!("\nNo export target: {}", target_error.as_deref().unwrap_or("unknown"));
                }
            }
        }
    }

    Ok(())
}

fn cmd_validate(args: SceneArgs, format: OutputFormat) -> Result<()> {
    let scene = read_scene(&args.scene, false)?;

    let problem = scene
        .validate()
        .and_then(|()| scene.export_target().map(|_| ()))
        .err();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": args.scene,
                "valid": problem.is_none(),
                "error": problem.as_ref().map(ToString::to_string),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            if problem.is_none() {
                println!("{:?}: OK", args.scene);
            }
        }
    }

    if let Some(err) = problem {
        bail!("Scene {} is not exportable: {}", args.scene.display(), err);
    }

    Ok(())
}
