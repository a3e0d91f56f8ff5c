use super::{drive, error_code, exit_code, file_system, SourceArgs};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::Path;
use waypath_core::{ResolveError, Resolved, ResolverFactory, Resource};

/// JSON shape of a successful resolve.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResolveReport<'a> {
    ok: bool,
    specifier: &'a str,
    from: &'a str,
    /// `null` when the request was mapped to `false`.
    resolved: Option<&'a str>,
    ignored: bool,
    description_file: Option<&'a str>,
    relative_path: Option<&'a str>,
    missing: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<&'a [String]>,
}

/// JSON shape of a failed resolve.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureReport<'a> {
    ok: bool,
    specifier: &'a str,
    from: &'a str,
    code: &'static str,
    error: String,
    missing: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<Vec<&'a str>>,
}

/// Run the resolve command.
///
/// Prints the resolved path (or a JSON report) to stdout. Exits with
/// status 1 when nothing matched and 2 on any other failure.
pub fn run(cwd: &Path, source: &SourceArgs, sync: bool, log: bool, json: bool) -> Result<()> {
    let directory = source.directory(cwd);
    let resolver = ResolverFactory::new(source.options(cwd)?)
        .file_system(file_system(sync))
        .build()
        .into_diagnostic()?;

    match drive(&resolver, &source.context(), &directory, &source.specifier, sync)? {
        Ok(resolved) => {
            if json {
                print_json(source, &directory, &resolved, log)
            } else {
                print_human(&resolved, log);
                Ok(())
            }
        }
        Err(err) => {
            if json {
                print_failure_json(source, &directory, &err, log)?;
            } else {
                print_failure_human(&err, log);
            }
            std::process::exit(exit_code(&err));
        }
    }
}

fn print_json(source: &SourceArgs, directory: &str, resolved: &Resolved, log: bool) -> Result<()> {
    let report = ResolveReport {
        ok: true,
        specifier: &source.specifier,
        from: directory,
        resolved: resolved.path(),
        ignored: resolved.resource == Resource::Ignored,
        description_file: resolved.request.description_file_path.as_deref(),
        relative_path: resolved.request.relative_path.as_deref(),
        missing: &resolved.missing,
        log: log.then_some(resolved.log.as_slice()),
    };
    let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn print_human(resolved: &Resolved, log: bool) {
    match &resolved.resource {
        Resource::Path(path) => println!("{path}"),
        Resource::Ignored => println!("false (ignored)"),
    }
    if log {
        for line in &resolved.log {
            eprintln!("{line}");
        }
    }
}

fn print_failure_json(
    source: &SourceArgs,
    directory: &str,
    err: &ResolveError,
    log: bool,
) -> Result<()> {
    let (missing, details): (&[String], Option<&str>) = match err {
        ResolveError::NotFound {
            missing, details, ..
        } => (missing.as_slice(), Some(details.as_str())),
        _ => (&[], None),
    };
    let report = FailureReport {
        ok: false,
        specifier: &source.specifier,
        from: directory,
        code: error_code(err),
        error: err.to_string(),
        missing,
        log: details.filter(|_| log).map(|d| d.lines().collect()),
    };
    let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn print_failure_human(err: &ResolveError, log: bool) {
    eprintln!("error: {err}");
    if let ResolveError::NotFound { details, .. } = err {
        if log {
            eprintln!("{details}");
        }
    }
}
