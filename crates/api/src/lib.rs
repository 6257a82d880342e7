mod error;
mod job_schedulers;
mod reminder;
mod shared;
mod status;
#[cfg(test)]
mod test_utils;
mod user;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use campus_infra::CampusContext;
pub use job_schedulers::{DelayScheduler, JobOutcome};
pub use reminder::{DispatchReminderUseCase, DispatchReport};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    reminder::configure_routes(cfg);
    status::configure_routes(cfg);
    user::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
    scheduler: DelayScheduler,
}

impl Application {
    pub async fn new(context: CampusContext) -> Result<Self, std::io::Error> {
        let (server, port) = Application::configure_server(context.clone()).await?;
        let scheduler = Application::start_delay_scheduler(context);

        Ok(Self {
            server,
            port,
            scheduler,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn start_delay_scheduler(context: CampusContext) -> DelayScheduler {
        let scheduler = DelayScheduler::new(context);
        scheduler.start();
        scheduler
    }

    async fn configure_server(context: CampusContext) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    /// Serves requests until the server shuts down, then stops the scheduler
    pub async fn start(self) -> Result<(), std::io::Error> {
        let res = self.server.await;
        self.scheduler.stop();
        res
    }
}
