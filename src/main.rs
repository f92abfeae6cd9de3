use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::info;
use nmldiff::{update, write_tree, Accumulator, Elements, WriteOptions};

/// Command-line arguments
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two or more configuration files
    Diff {
        /// Input files, folded in the order given
        #[arg(required = true, num_args = 2..)]
        input_files: Vec<PathBuf>,

        /// Labels for the input files, one per file and all distinct
        /// (defaults to the file stems)
        #[arg(short = 'l', long = "labels", value_delimiter = ',')]
        labels: Vec<String>,

        /// Write one CSV sheet per classification into this directory
        #[arg(short = 'e', long = "export", value_name = "DIR")]
        export: Option<PathBuf>,
    },
    /// Merge the values of another file into a base file
    Update {
        /// File to update
        base: PathBuf,

        /// File providing the new values
        other: PathBuf,

        /// Which values to take from the other file
        #[arg(short = 'e', long = "elements", value_enum, default_value_t = Elements::All)]
        elements: Elements,

        /// Output path (defaults to the base file)
        #[arg(short = 'o', long = "out")]
        out: Option<PathBuf>,

        /// Edit the original text, keeping comments and layout
        #[arg(short = 'p', long = "patch")]
        patch: bool,

        /// Replace the output file instead of backing it up
        #[arg(long = "overwrite")]
        overwrite: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // Parse command-line arguments
    let args = Args::parse();

    // Initialize the logger
    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    match args.command {
        Command::Diff {
            input_files,
            labels,
            export,
        } => {
            let labels = resolve_labels(&input_files, labels)?;
            info!("Comparing {} files.", input_files.len());

            let mut diff = Accumulator::new(&input_files[0], &labels[0])?;
            for (file, label) in input_files.iter().zip(&labels).skip(1) {
                diff.diff_in_place(file, label)?;
            }
            print!("{}", diff.dump()?);

            if let Some(dir) = export {
                export_sheets(&diff, &dir)?;
            }
        }
        Command::Update {
            base,
            other,
            elements,
            out,
            patch,
            overwrite,
        } => {
            let mut tree = nmldiff::source::read_tree(&base)?;
            update(&mut tree, &other, elements)?;
            let written = write_tree(&tree, &base, out.as_deref(), WriteOptions { patch, overwrite })?;
            info!("Updated tree written to {}", written.display());
        }
    }

    info!("Program completed successfully.");
    Ok(())
}

#[cfg(feature = "export")]
fn export_sheets(diff: &Accumulator, dir: &Path) -> Result<(), Box<dyn Error>> {
    let written = nmldiff::export::Workbook::from_accumulator(diff).write_csv_dir(dir)?;
    info!("{} sheets written to {}", written.len(), dir.display());
    Ok(())
}

#[cfg(not(feature = "export"))]
fn export_sheets(_diff: &Accumulator, _dir: &Path) -> Result<(), Box<dyn Error>> {
    Err("built without the `export` feature".into())
}

fn resolve_labels(files: &[PathBuf], labels: Vec<String>) -> Result<Vec<String>, Box<dyn Error>> {
    if labels.is_empty() {
        let stems: Vec<String> = files.iter().map(|f| file_label(f)).collect();
        if let Some(stem) = stems.iter().enumerate().find_map(|(i, s)| stems[..i].contains(s).then_some(s)) {
            return Err(format!(
                "several input files share the name {:?}; labels default to file stems, pass distinct ones with --labels",
                stem
            )
            .into());
        }
        return Ok(stems);
    }
    if labels.len() != files.len() {
        return Err(format!("got {} labels for {} input files", labels.len(), files.len()).into());
    }
    Ok(labels)
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input")
        .to_string()
}
