use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("no drawable geometry found{}", layer_suffix(.layer))]
    NoGeometryFound { layer: Option<String> },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

fn layer_suffix(layer: &Option<String>) -> String {
    match layer {
        Some(name) => format!(" on layer {name:?}"),
        None => String::new(),
    }
}
