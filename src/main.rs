use hoststat::app::App;
use hoststat::cli::parse_args;
use hoststat::config::Config;
use hoststat::core::{Poller, Sampler, SysinfoProvider};
use hoststat::logging;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args();

    let mut config = Config::load(args.config.as_deref())?;
    args.apply(&mut config);
    config.validate()?;

    let _log_guard = logging::init_tracing(&config.log)?;
    info!(
        refresh_ms = config.sampler.refresh_ms,
        top_n = config.sampler.top_n,
        "hoststat starting"
    );

    let sampler = Sampler::new(SysinfoProvider::new(), config.sampler_settings());
    let poller = Poller::spawn(sampler, config.refresh())?;

    let mut terminal = ratatui::init();

    let app_result = App::new(poller, config.refresh()).run(&mut terminal);

    ratatui::restore();

    app_result?;

    Ok(())
}
