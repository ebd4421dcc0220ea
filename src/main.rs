use clap::Parser;
use ghec_backup::{ghec_backup_main, GhecBackupCli};
use std::process::exit;

#[tokio::main]
async fn main() {
    let args = GhecBackupCli::parse();
    env_logger::builder()
        .filter_level(args.log_level())
        .format_target(false)
        .format_timestamp(None)
        .init();
    match ghec_backup_main(args).await {
        Ok(_) => {
            exit(0);
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit(2);
        }
    };
}
