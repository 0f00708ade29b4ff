//! `serve` command.

use super::{HandlerError, HandlerResult};
use crate::analyzer;
use crate::config::Config;
use crate::fetch::VcsFetcher;
use crate::scan::ScanOrchestrator;
use crate::service::ScanService;

pub fn handle_serve(config: &Config, listen: Option<&str>) -> Result<HandlerResult, HandlerError> {
    let listen = listen.unwrap_or(&config.service.listen);
    let service = ScanService::new(
        VcsFetcher::from_config(&config.fetch),
        ScanOrchestrator::new(analyzer::from_config(&config.analyzer), &config.scan),
    );
    println!("Listening on http://{listen}");
    service.serve(listen)?;
    Ok(HandlerResult::Success)
}
