use std::process::ExitCode;

use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use clouddns_update::{
    auth::CredentialsEnv,
    cli::{self, Invocation},
    update,
};

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let settings = match cli::invocation(std::env::args_os()) {
        Ok(Invocation::Update(settings)) => settings,
        Ok(Invocation::Help(usage)) => {
            eprint!("{}", usage);
            return ExitCode::SUCCESS;
        }
        Ok(Invocation::Version(version)) => {
            eprint!("{}", version);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    init_logging("warn");
    debug!(
        project = %settings.project,
        managed_zone = %settings.managed_zone,
        record_name = %settings.record_name,
        ip_addr = %settings.ip_addr,
        ttl = settings.ttl,
        "Updating record"
    );

    match update::run(&settings, &CredentialsEnv::from_process()).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
