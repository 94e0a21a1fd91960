use protogen_idl::Suggestion;
use std::error::Error as StdError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("template for target `{target}` does not compile: {message}")]
    TemplateSyntax { target: String, message: String },

    #[error("failed to render target `{target}`: {message}")]
    TemplateBinding { target: String, message: String },

    #[error("unknown target `{name}`{}", did_you_mean(.suggestions))]
    UnknownTarget {
        name: String,
        suggestions: Vec<Suggestion>,
    },

    #[error("failed to read template {path}: {source}")]
    TemplateIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server `{server}` has ordinal {ordinal}, too large for a bit flag")]
    ServerIdOverflow { server: String, ordinal: usize },

    #[error("response code `{code}` overflows with base {base}")]
    ResponseCodeOverflow { code: String, base: u64 },

    #[error("failed to fingerprint protocol: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

fn did_you_mean(suggestions: &[Suggestion]) -> String {
    match suggestions.first() {
        Some(s) => format!(" (did you mean `{}`?)", s.candidate),
        None => String::new(),
    }
}

impl ProjectError {
    pub(crate) fn syntax(target: &str, err: tera::Error) -> Self {
        ProjectError::TemplateSyntax {
            target: target.to_string(),
            message: error_chain(&err),
        }
    }

    pub(crate) fn binding(target: &str, err: tera::Error) -> Self {
        ProjectError::TemplateBinding {
            target: target.to_string(),
            message: error_chain(&err),
        }
    }
}

/// tera puts the useful detail (missing variable, bad filter argument) in
/// the source chain, not the top-level message.
fn error_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
