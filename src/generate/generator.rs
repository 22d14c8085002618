//! Template rendering, file write and record creation.

use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};
use thiserror::Error;

use crate::config::schema::{PathsConfig, TEMPLATE_EXTENSION};
use crate::error::ErrorKind;
use crate::generate::request::{
    validate_machine_id, validate_port, validate_save_destination, validate_server_names,
    validate_template_file_name, CreateSiteRequest, SiteSpecification, ValidationError,
};
use crate::nginx::Framework;
use crate::observability::metrics;
use crate::registry::{
    Machine, MachineDirectory, MachineId, NewSiteRecord, RegistryError, SiteRecord, SiteRegistry,
};

/// Errors that abort a generation attempt.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The app-host machine id does not resolve.
    #[error("machine {0} not found")]
    MachineNotFound(MachineId),

    /// The named template is absent, misnamed, or not a regular file.
    #[error("template {name} not found: {reason}")]
    TemplateNotFound { name: String, reason: String },

    /// The current host has no machine record.
    #[error("host {address} is not registered as a machine")]
    HostNotRegistered { address: Ipv4Addr },

    /// The app-host machine record carries no network address.
    #[error("machine {machine_id} has no local IP address")]
    MissingAddress { machine_id: MachineId },

    /// A site with this primary server name is already registered.
    #[error("site already registered for server name {0}")]
    Conflict(String),

    /// Reading or rendering the template failed.
    #[error("failed to render template {template}: {message}")]
    Render { template: String, message: String },

    /// Writing the generated file failed; no record was created.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl GenerateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerateError::Validation(_) => ErrorKind::Validation,
            GenerateError::MachineNotFound(_) | GenerateError::TemplateNotFound { .. } => {
                ErrorKind::NotFound
            }
            GenerateError::HostNotRegistered { .. } => ErrorKind::Precondition,
            GenerateError::Conflict(_) => ErrorKind::Conflict,
            GenerateError::Registry(RegistryError::DuplicateServerName(_)) => ErrorKind::Conflict,
            GenerateError::Render { .. } | GenerateError::Write { .. } => ErrorKind::WriteFailure,
            GenerateError::MissingAddress { .. } | GenerateError::Registry(_) => {
                ErrorKind::Internal
            }
        }
    }

    fn metric_label(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Precondition => "precondition",
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::WriteFailure => "write_failure",
            ErrorKind::Internal => "internal",
        }
    }
}

/// A generated file and the record describing it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    pub file_path: PathBuf,
    pub record: SiteRecord,
}

/// Everything resolved while validating, needed to render and record.
struct Resolved {
    spec: SiteSpecification,
    template_path: PathBuf,
    app_host_address: Ipv4Addr,
    nginx_host: Machine,
}

/// Produces new site files from templates.
pub struct TemplateGenerator<'a> {
    machines: &'a dyn MachineDirectory,
    sites: &'a dyn SiteRegistry,
    host_address: Ipv4Addr,
    paths: &'a PathsConfig,
}

impl<'a> TemplateGenerator<'a> {
    pub fn new(
        machines: &'a dyn MachineDirectory,
        sites: &'a dyn SiteRegistry,
        host_address: Ipv4Addr,
        paths: &'a PathsConfig,
    ) -> Self {
        Self {
            machines,
            sites,
            host_address,
            paths,
        }
    }

    /// Validate `request`, render its template, write the file, then record it.
    ///
    /// The record is only created after the write succeeds. If creating the
    /// record then fails the file stays on disk.
    pub fn generate(&self, request: &CreateSiteRequest) -> Result<GenerationResult, GenerateError> {
        let result = self
            .resolve(request)
            .and_then(|resolved| self.write_and_record(resolved));

        match &result {
            Ok(generated) => {
                tracing::info!(
                    server_name = %generated.record.server_name,
                    path = %generated.file_path.display(),
                    record_id = %generated.record.id,
                    "Site generated"
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, kind = ?e.kind(), "Site generation rejected");
                metrics::record_generation_failure(e.metric_label());
            }
        }
        result
    }

    /// Run every check in order, stopping at the first failure.
    fn resolve(&self, request: &CreateSiteRequest) -> Result<Resolved, GenerateError> {
        let fields = request.present_fields()?;
        let template_file_name = validate_template_file_name(fields.template_file_name)?;
        let server_names = validate_server_names(fields.server_names)?;
        let app_host_id = validate_machine_id(fields.app_host_machine_id)?;
        let app_host = self
            .machines
            .find_by_id(&app_host_id)?
            .ok_or(GenerateError::MachineNotFound(app_host_id))?;
        let port_number = validate_port(fields.port_number)?;
        let save_destination = validate_save_destination(fields.save_destination)?;

        let template_path = self.locate_template(&template_file_name)?;

        let nginx_host = self
            .machines
            .find_by_address(self.host_address)?
            .ok_or(GenerateError::HostNotRegistered {
                address: self.host_address,
            })?;

        let app_host_address = app_host
            .local_ip_address
            .ok_or(GenerateError::MissingAddress {
                machine_id: app_host.id,
            })?;

        let spec = SiteSpecification {
            template_file_name,
            server_names,
            app_host_machine_id: app_host.id,
            port_number,
            save_destination,
        };

        if self.sites.find_by_primary_name(spec.primary_server_name())?.is_some() {
            return Err(GenerateError::Conflict(spec.primary_server_name().to_string()));
        }

        Ok(Resolved {
            spec,
            template_path,
            app_host_address,
            nginx_host,
        })
    }

    fn locate_template(&self, name: &str) -> Result<PathBuf, GenerateError> {
        let not_found = |reason: String| GenerateError::TemplateNotFound {
            name: name.to_string(),
            reason,
        };

        let template_dir = self.paths.template_dir();
        if !template_dir.is_dir() {
            return Err(not_found(format!(
                "template directory does not exist: {}",
                template_dir.display()
            )));
        }
        if !name.ends_with(TEMPLATE_EXTENSION) {
            return Err(not_found(format!(
                "template file must have {TEMPLATE_EXTENSION} extension"
            )));
        }

        let path = template_dir.join(name);
        match fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(not_found("template path is not a file".to_string())),
            Err(_) => Err(not_found("template file does not exist".to_string())),
        }
    }

    fn write_and_record(&self, resolved: Resolved) -> Result<GenerationResult, GenerateError> {
        let Resolved {
            spec,
            template_path,
            app_host_address,
            nginx_host,
        } = resolved;

        let rendered = render(&template_path, &spec, app_host_address)?;

        let output_dir = self.paths.output_dir(spec.save_destination).clone();
        let file_path = output_dir.join(spec.save_destination.file_name(spec.primary_server_name()));
        write_new_file(&file_path, &rendered)?;

        tracing::info!(
            path = %file_path.display(),
            destination = %spec.save_destination,
            bytes = rendered.len(),
            "Site file written"
        );
        metrics::record_generation(spec.save_destination.as_str());

        let record = self.sites.create(NewSiteRecord {
            server_name: spec.primary_server_name().to_string(),
            additional_server_names: spec.additional_server_names().to_vec(),
            port_number: spec.port_number,
            app_host_machine_id: Some(spec.app_host_machine_id),
            nginx_host_machine_id: nginx_host.id,
            framework: Framework::default().label().to_string(),
            store_directory: output_dir,
        })?;

        Ok(GenerationResult { file_path, record })
    }
}

/// Substitute the site values into the template text.
///
/// Variables: `server_names` (space separated), `server_name` (primary),
/// `local_ip_address`, `port`.
pub fn render(
    template_path: &Path,
    spec: &SiteSpecification,
    app_host_address: Ipv4Addr,
) -> Result<String, GenerateError> {
    let template = template_path.display().to_string();
    let raw = fs::read_to_string(template_path).map_err(|e| GenerateError::Render {
        template: template.clone(),
        message: e.to_string(),
    })?;

    let mut context = Context::new();
    context.insert("server_names", &spec.server_names.join(" "));
    context.insert("server_name", spec.primary_server_name());
    context.insert("local_ip_address", &app_host_address.to_string());
    context.insert("port", &spec.port_number);

    Tera::one_off(&raw, &context, false).map_err(|e| GenerateError::Render {
        template,
        message: error_chain(&e),
    })
}

/// Tera nests the useful message in its source chain.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Write `content` to a file that must not exist yet.
fn write_new_file(path: &Path, content: &str) -> Result<(), GenerateError> {
    let write_err = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(write_err)?;
    file.write_all(content.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::request::SaveDestination;

    fn spec() -> SiteSpecification {
        SiteSpecification {
            template_file_name: "express.txt".into(),
            server_names: vec!["a.example.com".into(), "b.example.com".into()],
            app_host_machine_id: MachineId::new(),
            port_number: 8080,
            save_destination: SaveDestination::SitesAvailable,
        }
    }

    #[test]
    fn test_render_substitutes_every_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("express.txt");
        fs::write(
            &path,
            "server {\n    server_name {{ server_names }};\n    location / {\n        proxy_pass http://{{ local_ip_address }}:{{ port }};\n    }\n}\n",
        )
        .unwrap();

        let text = render(&path, &spec(), Ipv4Addr::new(10, 0, 0, 5)).unwrap();
        assert!(text.contains("server_name a.example.com b.example.com;"));
        assert!(text.contains("proxy_pass http://10.0.0.5:8080;"));

        // The rendered file reads back as the same facts.
        let facts = crate::nginx::parse(&text);
        assert_eq!(facts.server_names, vec!["a.example.com", "b.example.com"]);
        assert_eq!(facts.listen_port, Some(8080));
    }

    #[test]
    fn test_render_reports_undefined_variable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.txt");
        fs::write(&path, "server_name {{ nope }};").unwrap();

        let err = render(&path, &spec(), Ipv4Addr::new(10, 0, 0, 5)).unwrap_err();
        assert!(matches!(err, GenerateError::Render { .. }));
        assert_eq!(err.kind(), ErrorKind::WriteFailure);
    }

    #[test]
    fn test_write_new_file_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.example.com");
        write_new_file(&path, "first").unwrap();

        let err = write_new_file(&path, "second").unwrap_err();
        assert!(matches!(err, GenerateError::Write { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(GenerateError::MachineNotFound(MachineId::new()).kind(), ErrorKind::NotFound);
        assert_eq!(
            GenerateError::Registry(RegistryError::DuplicateServerName("a".into())).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            GenerateError::MissingAddress { machine_id: MachineId::new() }.kind(),
            ErrorKind::Internal
        );
    }
}
