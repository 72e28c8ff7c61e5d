use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use crate::algorithms::{EnumerationReport, JumpStatus, SolutionOrigin, SolutionSink};
use crate::clustering::Clustering;
use crate::error::{Error, Result};
use crate::graph::Graph;

/// Name of the manifest listing every accepted membership file.
pub const ALL_RESULTS_FILE: &str = "allResults.txt";

/// Name of the `lowerBound:path` manifest of neighborhood-search results.
pub const ASSOC_FILE: &str = "assoc.txt";

/// Name of the end-of-run summary.
pub const SUMMARY_FILE: &str = "summary.json";

/// Read a signed graph file.
///
/// The first line holds the vertex count; every other line is
/// `i<TAB>j<TAB>weight` for one undirected edge.
pub fn read_graph(file_path: &Path) -> Result<Graph> {
    parse_graph(BufReader::new(File::open(file_path)?))
}

/// Parse a signed graph from any reader, see [`read_graph`].
pub fn parse_graph<R: BufRead>(reader: R) -> Result<Graph> {
    let mut lines = reader.lines().enumerate();

    let num_vertices = match lines.next() {
        Some((_, line)) => {
            let line = line?;
            let first = line.split('\t').next().unwrap_or("").trim();
            first.parse::<usize>().map_err(|_| Error::GraphParse {
                line: 1,
                reason: format!("expected the vertex count, got '{}'", line),
            })?
        }
        None => {
            return Err(Error::GraphParse {
                line: 1,
                reason: "empty input".to_string(),
            })
        }
    };

    let mut edges = Vec::new();
    for (index, line) in lines {
        let line = line?;
        let line_number = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(Error::GraphParse {
                line: line_number,
                reason: format!("expected three tab-separated values, got '{}'", line),
            });
        }
        let parse_vertex = |field: &str| -> Result<usize> {
            let vertex = field.parse::<usize>().map_err(|_| Error::GraphParse {
                line: line_number,
                reason: format!("invalid vertex id '{}'", field),
            })?;
            if vertex >= num_vertices {
                return Err(Error::GraphParse {
                    line: line_number,
                    reason: format!("vertex {} out of range for {} vertices", vertex, num_vertices),
                });
            }
            Ok(vertex)
        };
        let i = parse_vertex(fields[0])?;
        let j = parse_vertex(fields[1])?;
        let weight = fields[2]
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .ok_or_else(|| Error::GraphParse {
                line: line_number,
                reason: format!("invalid weight '{}'", fields[2]),
            })?;
        edges.push((i, j, weight));
    }

    Ok(Graph::from_edges(num_vertices, &edges))
}

/// Read a membership file: exactly `num_vertices` lines, one 1-based label each.
///
/// Any line after the last label, blank or not, is an error.
pub fn read_membership(file_path: &Path, num_vertices: usize) -> Result<Clustering> {
    let file = File::open(file_path).map_err(|e| {
        Error::InvalidMembership(format!("cannot open {}: {}", file_path.display(), e))
    })?;
    let mut membership = Vec::with_capacity(num_vertices);

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| {
            Error::InvalidMembership(format!("{} line {}: {}", file_path.display(), index + 1, e))
        })?;
        let value = line.trim();
        if index >= num_vertices {
            return Err(Error::InvalidMembership(format!(
                "{} has more than {} labels",
                file_path.display(),
                num_vertices
            )));
        }
        let label = value.parse::<usize>().map_err(|_| {
            Error::InvalidMembership(format!(
                "{} line {}: invalid label '{}'",
                file_path.display(),
                index + 1,
                value
            ))
        })?;
        membership.push(label);
    }

    Clustering::new(membership, num_vertices)
}

/// Write a membership file, one label per line.
pub fn write_membership(clustering: &Clustering, file_path: &Path) -> std::io::Result<()> {
    let mut file = BufWriter::new(File::create(file_path)?);
    for label in clustering.membership() {
        writeln!(file, "{}", label)?;
    }
    file.flush()
}

/// Read a `lowerBound:path` manifest.
pub fn read_manifest(file_path: &Path) -> Result<Vec<(i64, PathBuf)>> {
    let file = File::open(file_path)?;
    let mut entries = Vec::new();

    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = line.split_once(':').and_then(|(bound, path)| {
            bound
                .trim()
                .parse::<i64>()
                .ok()
                .map(|bound| (bound, PathBuf::from(path.trim())))
        });
        match entry {
            Some(entry) => entries.push(entry),
            None => {
                return Err(Error::Collaborator(format!(
                    "{} line {}: expected 'lowerBound:path', got '{}'",
                    file_path.display(),
                    index + 1,
                    line
                )))
            }
        }
    }

    Ok(entries)
}

fn append_line(file_path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(file_path)?;
    writeln!(file, "{}", line)
}

/// Persists a run into an output directory.
///
/// Layout: `membership{K}.txt` per accepted solution, [`ALL_RESULTS_FILE`],
/// [`ASSOC_FILE`], `jump-status{Q}.txt` and `jump-exec-time{Q}.txt` for the
/// Q-th jump query, then [`SUMMARY_FILE`].
#[derive(Debug)]
pub struct DirectorySink {
    out_dir: PathBuf,
}

impl DirectorySink {
    /// Create the directory (if needed) and empty manifests.
    pub fn create(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)?;
        File::create(out_dir.join(ALL_RESULTS_FILE))?;
        File::create(out_dir.join(ASSOC_FILE))?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }

    pub fn membership_path(&self, index: usize) -> PathBuf {
        self.out_dir.join(format!("membership{}.txt", index))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(ALL_RESULTS_FILE)
    }
}

impl SolutionSink for DirectorySink {
    fn record_solution(&mut self, index: usize, clustering: &Clustering, origin: SolutionOrigin) -> Result<()> {
        let path = self.membership_path(index);
        write_membership(clustering, &path)?;
        append_line(&self.manifest_path(), &path.display().to_string())?;
        if let SolutionOrigin::Neighborhood { diversity_lower_bound } = origin {
            append_line(
                &self.out_dir.join(ASSOC_FILE),
                &format!("{}:{}", diversity_lower_bound, path.display()),
            )?;
        }
        debug!("wrote {}", path.display());
        Ok(())
    }

    fn record_jump(&mut self, query: usize, status: &JumpStatus, elapsed: Duration) -> Result<()> {
        fs::write(self.out_dir.join(format!("jump-status{}.txt", query)), status.to_string())?;
        fs::write(
            self.out_dir.join(format!("jump-exec-time{}.txt", query)),
            elapsed.as_secs_f64().to_string(),
        )?;
        Ok(())
    }

    fn finish(&mut self, report: &EnumerationReport) -> Result<()> {
        let file = BufWriter::new(File::create(self.out_dir.join(SUMMARY_FILE))?);
        serde_json::to_writer_pretty(file, report)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use approx::assert_ulps_eq;
    use tempfile::tempdir;
    use super::*;

    fn create_mock_file(dir: &Path, filename: &str, content: &str) -> PathBuf {
        let file_path = dir.join(filename);
        let mut file = File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_read_graph() -> Result<()> {
        // Arrange
        let temp_dir = tempdir()?;
        let content = "4\n0\t1\t1.5\n1\t2\t-2\n\n3\t0\t0.25\n2\t1\t-3\n";
        let graph_path = create_mock_file(temp_dir.path(), "graph.G", content);

        // Act
        let graph = read_graph(&graph_path)?;

        // Assert
        assert_eq!(graph.len(), 4);
        assert_ulps_eq!(graph.weight(1, 0), 1.5);
        assert_ulps_eq!(graph.weight(0, 3), 0.25);
        assert_ulps_eq!(graph.weight(1, 2), -3.0);
        assert_ulps_eq!(graph.weight(0, 2), 0.0);
        Ok(())
    }

    #[test]
    fn test_parse_graph_errors() {
        let short_line = parse_graph("3\n0\t1\n".as_bytes());
        assert!(matches!(short_line, Err(Error::GraphParse { line: 2, .. })));

        let out_of_range = parse_graph("3\n0\t1\t1\n0\t3\t1\n".as_bytes());
        assert!(matches!(out_of_range, Err(Error::GraphParse { line: 3, .. })));

        let bad_weight = parse_graph("3\n0\t1\tabc\n".as_bytes());
        assert!(matches!(bad_weight, Err(Error::GraphParse { line: 2, .. })));

        let bad_header = parse_graph("x\n".as_bytes());
        assert!(matches!(bad_header, Err(Error::GraphParse { line: 1, .. })));

        assert!(matches!(parse_graph("".as_bytes()), Err(Error::GraphParse { .. })));
    }

    #[test]
    fn test_read_membership() -> Result<()> {
        // Arrange
        let temp_dir = tempdir()?;
        let good = create_mock_file(temp_dir.path(), "good.txt", "1\n2\n1\n");
        let trailing_blank = create_mock_file(temp_dir.path(), "trailing.txt", "1\n2\n1\n\n");
        let short = create_mock_file(temp_dir.path(), "short.txt", "1\n2\n");
        let long = create_mock_file(temp_dir.path(), "long.txt", "1\n2\n1\n3\n");
        let garbage = create_mock_file(temp_dir.path(), "garbage.txt", "1\nx\n1\n");

        // Act
        let clustering = read_membership(&good, 3)?;

        // Assert
        assert_eq!(clustering.membership(), &[1, 2, 1]);
        assert!(matches!(read_membership(&short, 3), Err(Error::InvalidMembership(_))));
        assert!(matches!(read_membership(&long, 3), Err(Error::InvalidMembership(_))));
        assert!(matches!(read_membership(&trailing_blank, 3), Err(Error::InvalidMembership(_))));
        assert!(matches!(read_membership(&garbage, 3), Err(Error::InvalidMembership(_))));
        assert!(matches!(
            read_membership(&temp_dir.path().join("missing.txt"), 3),
            Err(Error::InvalidMembership(_))
        ));
        Ok(())
    }

    #[test]
    fn test_read_membership_rejects_invalid_utf8() -> Result<()> {
        // Arrange
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("binary.txt");
        fs::write(&path, [b'1', b'\n', 0xff, 0xfe, b'\n', b'1', b'\n'])?;

        // Act
        let result = read_membership(&path, 3);

        // Assert
        assert!(matches!(result, Err(Error::InvalidMembership(_))));
        Ok(())
    }

    #[test]
    fn test_write_then_read_membership() -> Result<()> {
        let temp_dir = tempdir()?;
        let path = temp_dir.path().join("membership.txt");
        let clustering = Clustering::new(vec![3, 1, 3, 2], 4)?;

        write_membership(&clustering, &path)?;

        assert_eq!(fs::read_to_string(&path)?, "3\n1\n3\n2\n");
        Ok(())
    }

    #[test]
    fn test_read_manifest() -> Result<()> {
        // Arrange
        let temp_dir = tempdir()?;
        let manifest = create_mock_file(temp_dir.path(), "assoc.txt", "2:out/1/sol0.txt\n\n5:C:/data/sol1.txt\n");
        let broken = create_mock_file(temp_dir.path(), "broken.txt", "out/1/sol0.txt\n");

        // Act
        let entries = read_manifest(&manifest)?;

        // Assert
        assert_eq!(
            entries,
            vec![(2, PathBuf::from("out/1/sol0.txt")), (5, PathBuf::from("C:/data/sol1.txt"))]
        );
        assert!(matches!(read_manifest(&broken), Err(Error::Collaborator(_))));
        Ok(())
    }

    #[test]
    fn test_directory_sink_layout() -> Result<()> {
        // Arrange
        let temp_dir = tempdir()?;
        let out_dir = temp_dir.path().join("run");
        let mut sink = DirectorySink::create(&out_dir)?;
        let initial = Clustering::new(vec![1, 1, 2], 3)?;
        let found = Clustering::new(vec![1, 2, 2], 3)?;

        // Act
        sink.record_solution(0, &initial, SolutionOrigin::Initial)?;
        sink.record_solution(1, &found, SolutionOrigin::Neighborhood { diversity_lower_bound: 2 })?;
        sink.record_jump(1, &JumpStatus::Infeasible, Duration::from_millis(1500))?;

        // Assert
        assert_eq!(fs::read_to_string(out_dir.join("membership1.txt"))?, "1\n2\n2\n");
        let all_results = fs::read_to_string(sink.manifest_path())?;
        assert_eq!(all_results.lines().count(), 2);
        let assoc = read_manifest(&out_dir.join(ASSOC_FILE))?;
        assert_eq!(assoc, vec![(2, sink.membership_path(1))]);
        assert_eq!(fs::read_to_string(out_dir.join("jump-status1.txt"))?, "Infeasible");
        assert_eq!(fs::read_to_string(out_dir.join("jump-exec-time1.txt"))?, "1.5");
        Ok(())
    }
}
