use clap::Parser;
use fluentgen::generate::GenerateOptions;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser, Debug)]
#[clap(version, about)]
struct Cli {
    /// Entity description file
    input: PathBuf,

    /// Write one <Entity>Configuration.cs per entity into this directory
    #[clap(short, long)]
    out_dir: Option<PathBuf>,

    /// Namespace for the generated classes
    #[clap(short, long)]
    namespace: Option<String>,

    /// Omit the using directives
    #[clap(long)]
    no_usings: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let input = match fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let options = GenerateOptions {
        namespace: cli.namespace,
        usings: !cli.no_usings,
    };

    let files = match fluentgen::generate(&input, &options) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };

    match cli.out_dir {
        Some(dir) => {
            if let Err(e) = fs::create_dir_all(&dir) {
                eprintln!("Failed to create {}: {}", dir.display(), e);
                process::exit(1);
            }
            for file in &files {
                let path = dir.join(&file.file_name);
                if let Err(e) = fs::write(&path, &file.contents) {
                    eprintln!("Failed to write {}: {}", path.display(), e);
                    process::exit(1);
                }
                log::info!("wrote {}", path.display());
            }
        }
        None => {
            let contents: Vec<&str> = files.iter().map(|f| f.contents.as_str()).collect();
            print!("{}", contents.join("\n"));
        }
    }
}
