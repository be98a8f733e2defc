//! CLI entry point.
//!
//! # Responsibility
//! - Without a subcommand, print deterministic `ping` and `version` lines.
//! - `render <text-id>` prints the segmentation of a stored text.
//! - `texts <principal-id>` lists texts visible to a principal.
//!
//! Configuration comes from `LECOTES_*` variables, optionally via `.env`.

use clap::{Parser, Subcommand};
use lecotes_core::{
    init_logging, open_db, AnnotationService, CoreConfig, SqliteAnnotationRepository,
};
use log::info;
use std::error::Error;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "lecotes_cli")]
#[command(version, about = "Inspect stored texts and their span annotations")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Print the plain and highlighted segments of a text
    Render {
        /// Id of the text to render
        text_id: Uuid,
    },
    /// List texts owned by or shared with a principal
    Texts {
        /// Id of the acting principal
        principal_id: Uuid,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    dotenvy::dotenv().ok();
    let config = CoreConfig::from_env();

    if let Some(log_dir) = config.log_dir.as_deref() {
        if let Err(err) = init_logging(&config.log_level, &log_dir.to_string_lossy()) {
            eprintln!("lecotes: logging disabled: {err}");
        }
    }

    let result = match args.command {
        None => {
            println!("lecotes_core ping={}", lecotes_core::ping());
            println!("lecotes_core version={}", lecotes_core::core_version());
            Ok(())
        }
        Some(Command::Render { text_id }) => render(&config, text_id),
        Some(Command::Texts { principal_id }) => texts(&config, principal_id),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("lecotes: {err}");
            ExitCode::FAILURE
        }
    }
}

fn render(config: &CoreConfig, text_id: Uuid) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&config.db_path)?;
    let service = AnnotationService::new(SqliteAnnotationRepository::try_new(&conn)?);

    let segments = service.render(text_id)?;
    info!(
        "event=cli_render module=cli status=ok text_id={text_id} segments={}",
        segments.len()
    );
    for segment in segments {
        match segment.annotation_id {
            Some(annotation_id) => println!(
                "[{}..{}] {annotation_id} {:?}",
                segment.start, segment.end, segment.text
            ),
            None => println!("[{}..{}] {:?}", segment.start, segment.end, segment.text),
        }
    }
    Ok(())
}

fn texts(config: &CoreConfig, principal_id: Uuid) -> Result<(), Box<dyn Error>> {
    let conn = open_db(&config.db_path)?;
    let service = AnnotationService::new(SqliteAnnotationRepository::try_new(&conn)?);

    for text in service.list_texts(principal_id)? {
        let role = if text.owner_id == principal_id {
            "owner"
        } else {
            "shared"
        };
        println!("{} {role} {:?}", text.id, text.title);
    }
    Ok(())
}
