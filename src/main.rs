use clap::ArgMatches;
use std::error::Error;

use notes_rust::app_bootstrap::{handle_migrate_command, handle_server_command};
use notes_rust::build_app;
use notes_rust::command_registry::{handle_version_command, ServerOverrides};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 构建命令行应用
    let matches: ArgMatches = build_app().get_matches();

    match matches.subcommand() {
        Some(("server", sub_matches)) => {
            handle_server_command(ServerOverrides::from_matches(sub_matches)).await?;
        }
        Some(("migrate", _)) => {
            handle_migrate_command().await?;
        }
        Some(("version", _)) => {
            handle_version_command();
        }
        _ => {
            // subcommand_required(true) 保证不会走到这里
            eprintln!("未知命令，请使用 --help 查看可用命令");
            std::process::exit(1);
        }
    }

    Ok(())
}
