// This file contains a neighborhood search delegated to an external
// recurrent neighborhood search (RNS) program.
//
// Each pass gets its own directory under the work directory. The frontier
// and every known solution are written as membership files, the program is
// launched and waited for, then its `lowerBound:path` manifest is read back.

use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};
use crate::algorithms::{Discovered, NeighborhoodRequest, NeighborhoodSearch};
use crate::error::{Error, Result};
use crate::io::{read_manifest, read_membership, write_membership, ALL_RESULTS_FILE, ASSOC_FILE};

/// Runs `java -D... -jar <jar>` once per pass.
#[derive(Debug, Clone)]
pub struct ExternalNeighborhoodSearch {
    java: PathBuf,
    jar: PathBuf,
    input_graph: PathBuf,
    work_dir: PathBuf,

    // Known solutions already written to the shared manifest.
    known_written: usize,
}

impl ExternalNeighborhoodSearch {
    pub fn new(jar: impl Into<PathBuf>, input_graph: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            java: PathBuf::from("java"),
            jar: jar.into(),
            input_graph: input_graph.into(),
            work_dir: work_dir.into(),
            known_written: 0,
        }
    }

    /// Use another launcher than the `java` found on the path.
    pub fn with_java(mut self, java: impl Into<PathBuf>) -> Self {
        self.java = java.into();
        self
    }

    fn pass_dir(&self, pass: usize) -> PathBuf {
        self.work_dir.join(format!("rns-pass{}", pass))
    }

    fn known_dir(&self) -> PathBuf {
        self.work_dir.join("rns-known")
    }

    // Write the frontier and bring the manifest of known solutions up to
    // date. Returns the frontier file and the manifest.
    fn write_inputs(&mut self, request: &NeighborhoodRequest<'_>, pass_dir: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::create_dir_all(pass_dir)?;
        let frontier_path = pass_dir.join("init-membership.txt");
        write_membership(request.frontier, &frontier_path)?;

        let known_dir = self.known_dir();
        fs::create_dir_all(&known_dir)?;
        let manifest_path = known_dir.join(ALL_RESULTS_FILE);
        let mut manifest = OpenOptions::new().create(true).append(true).open(&manifest_path)?;
        for (index, clustering) in request.known.iter().enumerate().skip(self.known_written) {
            let path = known_dir.join(format!("membership{}.txt", index));
            write_membership(clustering, &path)?;
            writeln!(manifest, "{}", path.display())?;
        }
        self.known_written = request.known.len();

        Ok((frontier_path, manifest_path))
    }

    fn command(&self, request: &NeighborhoodRequest<'_>, frontier: &Path, known: &Path, out_dir: &Path) -> Command {
        // The program reads -1 as unbounded.
        let time_limit = request
            .remaining_time
            .map_or(-1, |limit| limit.as_secs_f64().ceil().max(1.0) as i64);
        let solution_limit = request
            .remaining_solutions
            .map_or(-1, |limit| i64::try_from(limit).unwrap_or(i64::MAX));

        let property = |name: &str, value: &dyn std::fmt::Display| -> OsString {
            OsString::from(format!("-D{}={}", name, value))
        };

        let mut command = Command::new(&self.java);
        command
            .arg(property("inputFilePath", &self.input_graph.display()))
            .arg(property("outDir", &out_dir.display()))
            .arg(property("initMembershipFilePath", &frontier.display()))
            .arg(property("allPreviousResultsFilePath", &known.display()))
            .arg(property("maxNbEdit", &request.max_edit_distance))
            .arg(property("tilim", &time_limit))
            .arg(property("solLim", &solution_limit))
            .arg(property("isBruteForce", &false))
            .arg(property("nbThread", &request.thread_count))
            .arg(property("isIncrementalEditBFS", &false))
            .arg("-jar")
            .arg(&self.jar);
        command
    }
}

// Read `<out_dir>/assoc.txt` and every membership file it names.
fn collect_results(out_dir: &Path, num_vertices: usize) -> Result<Vec<Discovered>> {
    let manifest_path = out_dir.join(ASSOC_FILE);
    if !manifest_path.exists() {
        debug!("no {} in {}, nothing found", ASSOC_FILE, out_dir.display());
        return Ok(Vec::new());
    }

    let mut discovered = Vec::new();
    for (diversity_lower_bound, path) in read_manifest(&manifest_path)? {
        let path = if path.is_absolute() || path.exists() {
            path
        } else {
            out_dir.join(path)
        };
        let clustering = read_membership(&path, num_vertices)
            .map_err(|e| Error::Collaborator(format!("unreadable result {}: {}", path.display(), e)))?;
        discovered.push(Discovered {
            clustering,
            diversity_lower_bound,
        });
    }
    Ok(discovered)
}

impl NeighborhoodSearch for ExternalNeighborhoodSearch {
    fn explore(&mut self, request: &NeighborhoodRequest<'_>) -> Result<Vec<Discovered>> {
        if request.max_edit_distance == 0 || request.remaining_solutions == Some(0) {
            return Ok(Vec::new());
        }

        let pass_dir = self.pass_dir(request.pass);
        let (frontier, known) = self.write_inputs(request, &pass_dir)?;
        let mut command = self.command(request, &frontier, &known, &pass_dir);
        debug!("pass {}: running {:?}", request.pass, command);

        let output = command
            .output()
            .map_err(|e| Error::Collaborator(format!("cannot launch {}: {}", self.java.display(), e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("pass {}: neighborhood search exited with {}", request.pass, output.status);
            return Err(Error::Collaborator(format!(
                "neighborhood search exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        collect_results(&pass_dir, request.graph.len())
    }
}
