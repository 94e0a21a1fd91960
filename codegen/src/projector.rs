//! Projection of a normalized model into target source text

use crate::error::ProjectError;
use protogen_idl::NormalizedModel;

/// Turns a normalized model into source text for one target.
///
/// Projection only reads the model, so several projectors may run against
/// the same model at once.
pub trait Projector: Send + Sync {
    /// Target name, used for logging and error context.
    fn target(&self) -> &str;

    fn project(&self, model: &NormalizedModel) -> Result<String, ProjectError>;
}

/// Run every projector against `model`, one thread per projector.
///
/// Results come back in projector order regardless of completion order.
pub fn project_all(
    model: &NormalizedModel,
    projectors: &[&dyn Projector],
) -> Vec<Result<String, ProjectError>> {
    if let [single] = projectors {
        return vec![single.project(model)];
    }

    std::thread::scope(|scope| {
        let handles: Vec<_> = projectors
            .iter()
            .map(|projector| {
                let projector = *projector;
                scope.spawn(move || {
                    let _span =
                        tracing::info_span!("project", target_name = projector.target()).entered();
                    projector.project(model)
                })
            })
            .collect();

        handles
            .into_iter()
            .zip(projectors)
            .map(|(handle, projector)| {
                handle.join().unwrap_or_else(|_| {
                    Err(ProjectError::TemplateBinding {
                        target: projector.target().to_string(),
                        message: "projection thread panicked".to_string(),
                    })
                })
            })
            .collect()
    })
}
