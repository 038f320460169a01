use hellod::middleware::RequestLog;
use hellod::{Config, Server};
use log::error;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            std::process::exit(1);
        }
    };

    let mut app = Server::new();
    app.middleware(RequestLog);
    app.get("/", |_req| async { "Hello World!" });

    if let Err(err) = app.listen(&config.address()) {
        error!("server error: {}", err);
        std::process::exit(1);
    }
}
