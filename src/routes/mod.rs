pub mod tags;

use actix_web::web;

pub fn create_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/tag").configure(tags::create_routes));
}
