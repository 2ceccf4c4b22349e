use file_manager::Interpreter;
use file_manager::config::Settings;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let settings = Settings::from_args(std::env::args().skip(1));
    log::debug!("starting session for {}", settings.user_name);
    Interpreter::from_settings(&settings).repl()
}
