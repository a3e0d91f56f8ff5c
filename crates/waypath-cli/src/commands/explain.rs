use super::{drive, exit_code, file_system, SourceArgs};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use waypath_core::plugins::LogInfoPlugin;
use waypath_core::{Hook, ResolveError, ResolverFactory, Stage};

#[derive(Serialize)]
struct Explanation<'a> {
    specifier: &'a str,
    from: &'a str,
    resolved: Option<String>,
    error: Option<String>,
    log: Vec<String>,
}

/// Run the explain command.
///
/// Every stage gets a request dump in its `before` phase, so the log reads
/// as a trace of the whole pipeline. Uses blocking filesystem calls.
pub fn run(cwd: &Path, source: &SourceArgs, json: bool) -> Result<()> {
    let directory = source.directory(cwd);
    let mut factory = ResolverFactory::new(source.options(cwd)?).file_system(file_system(true));
    for stage in Stage::ALL {
        factory = factory.plugin(Hook::before(stage), LogInfoPlugin::new(Hook::before(stage)));
    }
    let resolver = factory.build().into_diagnostic()?;

    let outcome = drive(&resolver, &source.context(), &directory, &source.specifier, true)?;
    let (resolved, error, log) = match &outcome {
        Ok(resolved) => (
            Some(
                resolved
                    .path()
                    .map_or_else(|| "false".to_string(), str::to_string),
            ),
            None,
            resolved.log.clone(),
        ),
        Err(err) => {
            let log = match err {
                ResolveError::NotFound { details, .. } => {
                    details.lines().map(str::to_string).collect()
                }
                _ => Vec::new(),
            };
            (None, Some(err.to_string()), log)
        }
    };

    if json {
        let explanation = Explanation {
            specifier: &source.specifier,
            from: &directory,
            resolved,
            error,
            log,
        };
        let json = serde_json::to_string_pretty(&explanation).into_diagnostic()?;
        println!("{json}");
    } else {
        let mut out = io::stdout().lock();
        for line in &log {
            writeln!(out, "{line}").into_diagnostic()?;
        }
        match (&resolved, &error) {
            (Some(path), _) => writeln!(out, "=> {path}").into_diagnostic()?,
            (_, Some(error)) => writeln!(out, "error: {error}").into_diagnostic()?,
            _ => {}
        }
    }

    if let Err(err) = &outcome {
        std::process::exit(exit_code(err));
    }
    Ok(())
}
