use utoipa::{Modify, OpenApi};

use crate::features::rca::{dtos as rca_dtos, handlers as rca_handlers};

#[derive(OpenApi)]
#[openapi(
    paths(
        rca_handlers::index,
        rca_handlers::uploaded_file,
        rca_handlers::generate,
    ),
    components(
        schemas(
            rca_dtos::GenerateReportForm,
        )
    ),
    tags(
        (name = "rca", description = "RCA report submission and attachment access"),
    ),
    info(
        title = "RCA Report Service",
        version = "0.1.0",
        description = "Generates root-cause-analysis PDF reports from form submissions",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
