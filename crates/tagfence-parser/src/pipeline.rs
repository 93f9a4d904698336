use crate::extractor::ImportExtractor;
use crate::resolver::{ModuleResolver, ModuleTable, Resolution};
use crate::scanner::{scan_source_files, ScannedFile};
use crossbeam_channel::{bounded, RecvTimeoutError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tagfence_core::{
    AnalysisConfig, AnalysisObserver, EdgeTarget, PackageIndex, ResolvedEdge, Result,
    TagFenceError, Warning,
};
use tracing::{debug, info};

/// Everything one run of the analysis pipeline produces.
///
/// Edges and warnings are sorted by (file, line), so two runs over an
/// unchanged tree compare equal.
#[derive(Debug, Default, Serialize)]
pub struct AnalysisOutcome {
    pub edges: Vec<ResolvedEdge>,
    pub warnings: Vec<Warning>,
    /// Packages owning at least one scanned file; the graph's node set.
    pub source_packages: BTreeSet<String>,
    pub files_scanned: usize,
    pub files_analyzed: usize,
    /// The run deadline elapsed and outstanding workers were abandoned. What
    /// was aggregated is still whole-file consistent.
    pub deadline_hit: bool,
}

/// Per-file worker result. One message per file, so aggregation can never
/// half-merge a file's edges.
enum FileOutcome {
    Analyzed {
        package: Option<String>,
        edges: Vec<ResolvedEdge>,
        warnings: Vec<Warning>,
    },
    Failed(Warning),
}

/// Runs scan → extract → resolve over `project_root` with a bounded worker
/// pool, aggregating per-file results single-threaded.
///
/// Per-file failures (unreadable file, parse error, unresolved import) are
/// demoted to warnings; only configuration problems abort the run.
pub fn analyze(
    project_root: &Path,
    index: &PackageIndex,
    config: &AnalysisConfig,
    observer: &dyn AnalysisObserver,
) -> Result<AnalysisOutcome> {
    config.validate()?;
    // Surface a broken grammar before any worker spawns.
    ImportExtractor::new()?;

    let scan = scan_source_files(project_root, &config.exclude_patterns)?;
    for warning in &scan.warnings {
        observer.on_warning(warning);
    }

    let table = ModuleTable::from_paths(scan.files.iter().map(|f| f.rel_path.clone()));
    debug!(
        "module table ready: {} files, {} workers",
        table.len(),
        config.workers
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| {
            TagFenceError::Configuration(format!("failed to build worker pool: {}", e))
        })?;

    let deadline = config.deadline.map(|d| Instant::now() + d);
    let (tx, rx) = bounded::<FileOutcome>(config.workers * 2);

    let mut outcome = AnalysisOutcome {
        files_scanned: scan.files.len(),
        warnings: scan.warnings,
        ..Default::default()
    };

    std::thread::scope(|scope| {
        let files = &scan.files;
        let table = &table;
        let roots = config.source_roots.as_slice();
        let _workers = scope.spawn(move || {
            let _ = pool.install(|| {
                files.par_iter().try_for_each_init(
                    ImportExtractor::new,
                    |extractor, file| -> std::result::Result<(), ()> {
                        let extractor = extractor.as_mut().map_err(|_| ())?;
                        let message = process_file(extractor, file, table, index, roots);
                        // A send failure means the aggregator is gone
                        // (deadline hit); stop producing.
                        tx.send(message).map_err(|_| ())
                    },
                )
            });
        });

        loop {
            let message = match deadline {
                Some(at) => match rx.recv_deadline(at) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => {
                        outcome.deadline_hit = true;
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            match message {
                FileOutcome::Analyzed {
                    package,
                    edges,
                    warnings,
                } => {
                    outcome.files_analyzed += 1;
                    if let Some(package) = package {
                        outcome.source_packages.insert(package);
                    }
                    for warning in &warnings {
                        observer.on_warning(warning);
                    }
                    outcome.edges.extend(edges);
                    outcome.warnings.extend(warnings);
                }
                FileOutcome::Failed(warning) => {
                    outcome.files_analyzed += 1;
                    observer.on_warning(&warning);
                    outcome.warnings.push(warning);
                }
            }
        }
        // Unblocks any worker still waiting to send once the deadline fired.
        drop(rx);
    });

    outcome.edges.sort();
    outcome.warnings.sort();

    info!(
        "analysis complete: {}/{} files, {} edges, {} warnings",
        outcome.files_analyzed,
        outcome.files_scanned,
        outcome.edges.len(),
        outcome.warnings.len()
    );
    Ok(outcome)
}

/// read → extract → resolve for one file. Pure with respect to shared state;
/// the only I/O is the local file read.
fn process_file(
    extractor: &mut ImportExtractor,
    file: &ScannedFile,
    table: &ModuleTable,
    index: &PackageIndex,
    roots: &[String],
) -> FileOutcome {
    let source = match std::fs::read_to_string(&file.abs_path) {
        Ok(source) => source,
        Err(e) => return FileOutcome::Failed(Warning::scan_io(file.rel_path.clone(), e.to_string())),
    };

    let imports = match extractor.extract(&file.rel_path, &source) {
        Ok(imports) => imports,
        Err(e) => {
            return FileOutcome::Failed(Warning::parse_error(file.rel_path.clone(), e.to_string()))
        }
    };

    let Some(source_package) = index.package_for(&file.rel_path) else {
        // Unassigned files are scanned but never produce edges.
        return FileOutcome::Analyzed {
            package: None,
            edges: Vec::new(),
            warnings: Vec::new(),
        };
    };

    let resolver = ModuleResolver::new(table, roots);
    let mut edges = Vec::new();
    let mut warnings = Vec::new();
    for import in &imports {
        match resolver.resolve(import, &file.rel_path) {
            Resolution::Module(module_path) => match index.package_for(&module_path) {
                Some(target) if target.path == source_package.path => {
                    // Intra-package references are out of policy scope.
                }
                Some(target) => edges.push(ResolvedEdge {
                    file: file.rel_path.clone(),
                    line: import.line,
                    source_package: source_package.path.clone(),
                    target: EdgeTarget::Package(target.path.clone()),
                    module_path: Some(module_path),
                }),
                None => {
                    // In-project but unowned: no policy-bearing target.
                }
            },
            Resolution::External => edges.push(ResolvedEdge {
                file: file.rel_path.clone(),
                line: import.line,
                source_package: source_package.path.clone(),
                target: EdgeTarget::External,
                module_path: None,
            }),
            Resolution::Unresolved => warnings.push(Warning::unresolved_import(
                file.rel_path.clone(),
                import.line,
                &import.written_form(),
            )),
        }
    }

    FileOutcome::Analyzed {
        package: Some(source_package.path.clone()),
        edges,
        warnings,
    }
}
