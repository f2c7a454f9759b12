use askama::Template;

use super::{is_exposed, route_plan, ModelNames, RouteDef, Target};
use crate::analysis::ModelAnalysis;
use crate::config::GeneratorConfig;
use crate::generator::orchestrator::{ArtifactFile, LayerGenerator};
use crate::schema::Model;

/// All methods registered on one path, as an axum `MethodRouter` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteGroup {
    pub path: String,
    /// `get(handlers::a::<S>).post(handlers::b::<S>)`
    pub chain: String,
}

/// Group routes by path in first-seen order.
pub(crate) fn group_by_path(routes: &[RouteDef]) -> Vec<RouteGroup> {
    let mut groups: Vec<RouteGroup> = Vec::new();
    for route in routes {
        let call = format!("{}(handlers::{}::<S>)", route.method_lower(), route.handler);
        match groups.iter_mut().find(|g| g.path == route.path) {
            Some(group) => {
                group.chain.push('.');
                group.chain.push_str(&call);
            }
            None => groups.push(RouteGroup {
                path: route.path.clone(),
                chain: call,
            }),
        }
    }
    groups
}

#[derive(Template)]
#[template(path = "routes_axum.rs.txt", escape = "none")]
struct AxumRoutesTemplateData {
    model_name: String,
    service_use: String,
    service_trait: String,
    handlers_use: String,
    routes: Vec<RouteDef>,
    groups: Vec<RouteGroup>,
}

#[derive(Template)]
#[template(path = "routes_actix.rs.txt", escape = "none")]
struct ActixRoutesTemplateData {
    model_name: String,
    service_use: String,
    service_trait: String,
    handlers_use: String,
    routes: Vec<RouteDef>,
}

/// Route table plus an axum `router` or actix `configure` function.
pub struct RoutesLayer;

impl LayerGenerator<GeneratorConfig> for RoutesLayer {
    fn name(&self) -> &str {
        "routes"
    }

    fn generate(
        &self,
        model: &Model,
        analysis: &ModelAnalysis,
        config: &GeneratorConfig,
    ) -> anyhow::Result<Vec<ArtifactFile>> {
        if !is_exposed(model, analysis) {
            return Ok(Vec::new());
        }
        let target = Target::from_config(config)?;
        // Item routes need a key, same as the handlers.
        super::id_type(model)?;
        let names = ModelNames::of(model);
        let routes = route_plan(model, analysis, config)?;
        let service_trait = format!("{}Service", names.type_name);
        let service_use = format!("{}::{service_trait}", names.import(&config.import_root, "services"));
        let handlers_use = names.import(&config.import_root, "handlers");

        let rendered = match target {
            Target::Axum => AxumRoutesTemplateData {
                model_name: names.model_name.clone(),
                service_use,
                service_trait,
                handlers_use,
                groups: group_by_path(&routes),
                routes,
            }
            .render()?,
            Target::Actix => ActixRoutesTemplateData {
                model_name: names.model_name.clone(),
                service_use,
                service_trait,
                handlers_use,
                routes,
            }
            .render()?,
        };
        Ok(vec![ArtifactFile::new(format!("routes/{}", names.module), rendered)])
    }
}
