//! Payloads de ejemplo leídos una sola vez al arrancar.
//!
//! - `input`/`output`: cuerpo de `workflows_input_output`.
//! - `job_outputs`: archivos `N.json` de un directorio, en orden numérico;
//!   si no hay ninguno se usa `output` como único payload de jobs.

use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wfload_core::TableKind;

use crate::config::FixturePaths;
use crate::errors::GeneratorError;

static JOB_FILE_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)\.json$").expect("valid regex"));

#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    pub input: Option<Arc<str>>,
    pub output: Option<Arc<str>>,
    pub job_outputs: Vec<Arc<str>>,
}

impl Fixtures {
    /// Lee sólo lo que necesitan las tablas seleccionadas.
    pub fn load(paths: &FixturePaths, tables: &[TableKind]) -> Result<Self, GeneratorError> {
        let mut fixtures = Fixtures::default();
        if tables.contains(&TableKind::InputOutput) {
            fixtures.input = Some(read_payload(&paths.input)?);
            fixtures.output = Some(read_payload(&paths.output)?);
        }
        if tables.contains(&TableKind::Jobs) {
            fixtures.job_outputs = read_job_dir(&paths.job_dir)?;
            if fixtures.job_outputs.is_empty() {
                warn!("fixtures:jobs dir={} has no N.json files, using {} as the only job payload",
                      paths.job_dir.display(),
                      paths.output.display());
                let output = match &fixtures.output {
                    Some(output) => Arc::clone(output),
                    None => read_payload(&paths.output)?,
                };
                fixtures.job_outputs.push(output);
            }
        }
        info!("fixtures:loaded input={} output={} job_payloads={}",
              fixtures.input.as_ref().map_or(0, |s| s.len()),
              fixtures.output.as_ref().map_or(0, |s| s.len()),
              fixtures.job_outputs.len());
        Ok(fixtures)
    }

    /// Payloads de `workflows_input_output`, si se cargaron.
    pub fn input_output(&self) -> Result<(Arc<str>, Arc<str>), GeneratorError> {
        match (&self.input, &self.output) {
            (Some(input), Some(output)) => Ok((Arc::clone(input), Arc::clone(output))),
            _ => Err(GeneratorError::Config("input/output fixtures were not loaded".into())),
        }
    }
}

fn read_payload(path: &Path) -> Result<Arc<str>, GeneratorError> {
    fs::read_to_string(path).map(Arc::from)
                            .map_err(|source| GeneratorError::Fixture { path: path.to_path_buf(),
                                                                        source })
}

/// Archivos `N.json` ordenados por `N`. Un directorio inexistente equivale a vacío.
fn read_job_dir(dir: &Path) -> Result<Vec<Arc<str>>, GeneratorError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(GeneratorError::Fixture { path: dir.to_path_buf(),
                                                 source })
        }
    };
    let mut numbered: Vec<(u64, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| GeneratorError::Fixture { path: dir.to_path_buf(),
                                                                     source })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(caps) = name.to_str().and_then(|n| JOB_FILE_NAME.captures(n)) else {
            continue;
        };
        // Un número que no entra en u64 no es un nombre válido.
        if let Ok(n) = caps[1].parse::<u64>() {
            numbered.push((n, path));
        }
    }
    numbered.sort();
    numbered.iter().map(|(_, path)| read_payload(path)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(root: &Path) -> FixturePaths {
        FixturePaths { input: root.join("wf_input.json"),
                       output: root.join("wf_output.json"),
                       job_dir: root.join("jobs") }
    }

    #[test]
    fn job_files_sorted_numerically_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let jobs = dir.path().join("jobs");
        fs::create_dir(&jobs).unwrap();
        fs::write(jobs.join("10.json"), "ten").unwrap();
        fs::write(jobs.join("2.json"), "two").unwrap();
        fs::write(jobs.join("1.json"), "one").unwrap();
        fs::write(jobs.join("notes.json"), "skip").unwrap();
        fs::write(jobs.join("3.json.bak"), "skip").unwrap();
        fs::create_dir(jobs.join("4.json")).unwrap();

        let fx = Fixtures::load(&paths(dir.path()), &[TableKind::Jobs]).unwrap();
        let got: Vec<&str> = fx.job_outputs.iter().map(|s| &**s).collect();
        assert_eq!(got, vec!["one", "two", "ten"]);
        assert!(fx.input.is_none());
    }

    #[test]
    fn jobs_fall_back_to_output_fixture() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("wf_output.json"), "{\"out\":true}").unwrap();
        let fx = Fixtures::load(&paths(dir.path()), &[TableKind::Jobs]).unwrap();
        assert_eq!(fx.job_outputs.len(), 1);
        assert_eq!(&*fx.job_outputs[0], "{\"out\":true}");
    }

    #[test]
    fn missing_input_fixture_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("wf_output.json"), "{}").unwrap();
        let err = Fixtures::load(&paths(dir.path()), &[TableKind::InputOutput]).unwrap_err();
        assert!(matches!(err, GeneratorError::Fixture { ref path, .. } if path.ends_with("wf_input.json")));
    }

    #[test]
    fn instances_need_no_fixtures() {
        let dir = tempfile::tempdir().unwrap();
        let fx = Fixtures::load(&paths(dir.path()), &[TableKind::Instances]).unwrap();
        assert!(fx.input.is_none() && fx.output.is_none() && fx.job_outputs.is_empty());
        assert!(fx.input_output().is_err());
    }
}
