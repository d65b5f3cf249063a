//! # Integration Tests
//!
//! Cross-crate and end-to-end tests.
//!
//! - Contract checks over the full stage plan
//! - Mock e2e runs covering every outcome and exit status
//! - Real shell-script tools driven through the process runner (unix)

#[cfg(test)]
mod contract_tests {
    use contracts::{
        stage_failure_exit_code, ArtifactKind, FailureCause, StageDecision, StageId, Verdict,
    };
    use stage_engine::Plan;

    #[test]
    fn test_every_exit_code_has_one_decision() {
        let plan = Plan::certification();
        for spec in plan.stages() {
            let Verdict::ExitCodes(table) = &spec.verdict else {
                continue;
            };
            for code in (-300..300).chain([i32::MIN, i32::MAX]) {
                let decision = table.decide(code);
                let allowed = match decision {
                    StageDecision::ProvedTrue => spec.id == StageId::Solve,
                    _ => true,
                };
                assert!(allowed, "{} maps {code} to {decision:?}", spec.id);
            }
        }
    }

    #[test]
    fn test_only_solver_codes_are_meaningful() {
        let plan = Plan::certification();
        for spec in plan.stages() {
            if let Verdict::ExitCodes(table) = &spec.verdict {
                for code in table.explicit_codes() {
                    assert!([0, 10, 20].contains(&code), "{} has rule for {code}", spec.id);
                }
            }
        }
    }

    #[test]
    fn test_trimmed_artifacts_unused_afterwards() {
        let plan = Plan::certification();
        let stages = plan.stages();
        for (index, spec) in stages.iter().enumerate() {
            for artifact in &spec.trim_after {
                assert_ne!(*artifact, ArtifactKind::StrategyCircuit);
                assert!(stages[index + 1..]
                    .iter()
                    .all(|later| !later.inputs.contains(artifact)));
            }
        }
    }

    #[test]
    fn test_config_overrides_reach_manifest() {
        use config_loader::{ConfigFormat, ConfigLoader};
        use contracts::{ToolId, ToolManifest};
        use std::path::{Path, PathBuf};

        let config = ConfigLoader::load_from_str(
            "tool_root = \"/opt/qbf\"\n\n[tools]\nqbf_solver = \"bin/ijtihad\"\ncertificate_sat_solver = \"/usr/bin/cadical\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let overrides = ConfigLoader::tool_overrides(&config).unwrap();
        let manifest = ToolManifest::resolve(config.tool_root.as_deref().unwrap(), &overrides);

        assert_eq!(manifest.path(ToolId::QbfSolver), Path::new("/opt/qbf/bin/ijtihad"));
        assert_eq!(
            manifest.path(ToolId::CertificateSatSolver),
            Path::new("/usr/bin/cadical")
        );
        assert_eq!(
            manifest.path(ToolId::TraceChecker),
            PathBuf::from("/opt/qbf/booleforce-1.2/tracecheck")
        );
    }

    #[test]
    fn test_failure_statuses_distinct_per_stage() {
        let mut seen = Vec::new();
        for stage in StageId::ALL {
            let code = stage_failure_exit_code(stage, &FailureCause::ToolError);
            assert!(!seen.contains(&code));
            seen.push(code);
        }
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::time::Duration;

    use contracts::{
        CleanupPolicy, FailureCause, RunOutcome, StageId, ToolId, ToolManifest,
        TRACE_CHECK_SUCCESS,
    };
    use stage_engine::{
        cancel_pair, CancelSignal, ExecutorOptions, RunPaths, RunReport, StageExecutor, Teardown,
        Workspace,
    };
    use toolchain::{MockBehavior, MockToolRunner};

    struct Run {
        dir: tempfile::TempDir,
        paths: RunPaths,
    }

    impl Run {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let formula = dir.path().join("adder.qdimacs");
            std::fs::write(&formula, "p cnf 3 2\na 1 0\ne 2 3 0\n1 2 0\n-1 3 0\n").unwrap();
            let workspace = Workspace::path_for(&dir.path().join("tmp"), 1000);
            std::fs::create_dir_all(&workspace).unwrap();
            let paths = RunPaths::new(formula, dir.path().join("adder.aag"), workspace);
            Self { dir, paths }
        }
    }

    fn executor(runner: MockToolRunner, options: ExecutorOptions) -> StageExecutor<MockToolRunner> {
        let manifest = ToolManifest::resolve(Path::new("/opt/qbf"), &BTreeMap::new());
        StageExecutor::new(
            runner,
            manifest,
            ExecutorOptions {
                announce: false,
                ..options
            },
        )
    }

    async fn run_with(runner: MockToolRunner) -> (Run, RunReport) {
        let run = Run::new();
        let exec = executor(runner, ExecutorOptions::default());
        let report = exec.run(&run.paths, &CancelSignal::never()).await;
        (run, report)
    }

    /// Formula proved true: status 1, no output written
    #[tokio::test]
    async fn test_e2e_proved_true() {
        let (run, report) = run_with(MockToolRunner::proving_true()).await;
        assert_eq!(report.outcome, RunOutcome::ProvedTrue);
        assert_eq!(report.outcome.exit_code(), 1);
        assert!(!run.paths.output.exists());
        assert!(!run.dir.path().join("adder.aag.gz").exists());
    }

    /// Every stage answers its continue code: certified and compressed
    #[tokio::test]
    async fn test_e2e_certified() {
        let (run, report) = run_with(MockToolRunner::certifying()).await;
        assert_eq!(report.outcome, RunOutcome::Certified);
        assert_eq!(report.outcome.exit_code(), 0);
        assert_eq!(
            report.stages.iter().map(|r| r.stage).collect::<Vec<_>>(),
            StageId::ALL.to_vec()
        );
        assert!(run.dir.path().join("adder.aag.gz").is_file());
        assert!(!run.paths.output.exists());
    }

    #[tokio::test]
    async fn test_e2e_uncompressed_output() {
        let run = Run::new();
        let exec = executor(
            MockToolRunner::certifying(),
            ExecutorOptions {
                compress_output: false,
                ..ExecutorOptions::default()
            },
        );
        let report = exec.run(&run.paths, &CancelSignal::never()).await;
        assert_eq!(report.certificate.as_deref(), Some(run.paths.output.as_path()));
        assert!(run.paths.output.is_file());
    }

    /// One injected failure per stage, with its exit status
    #[tokio::test]
    async fn test_e2e_stage_failure_statuses() {
        let wrong_trace = MockBehavior::exit_code(0).with_stdout("resolved 1 root\n");
        let cases = [
            (ToolId::QbfSolver, MockBehavior::exit_code(0), StageId::Solve, 2),
            (ToolId::ProofSatSolver, MockBehavior::exit_code(10), StageId::ExpandCheck, 3),
            (ToolId::ProofSatSolver, MockBehavior::exit_code(1), StageId::ExpandCheck, 4),
            (ToolId::TraceChecker, wrong_trace, StageId::ProofCheck, 5),
            (ToolId::TraceMerger, MockBehavior::exit_code(1), StageId::TraceMerge, 6),
            (ToolId::FerpChecker, MockBehavior::exit_code(3), StageId::TraceValidate, 7),
            (ToolId::StrategyExtractor, MockBehavior::terminated(), StageId::StrategyExtract, 8),
            (ToolId::CertificateMerger, MockBehavior::exit_code(2), StageId::Recombine, 9),
            (ToolId::CertificateSatSolver, MockBehavior::exit_code(10), StageId::Certify, 10),
            (ToolId::CertificateSatSolver, MockBehavior::exit_code(0), StageId::Certify, 11),
        ];

        for (tool, behavior, stage, status) in cases {
            let (run, report) = run_with(MockToolRunner::certifying().with_behavior(tool, behavior)).await;
            let RunOutcome::StageFailed(failure) = &report.outcome else {
                panic!("{tool}: expected failure, got {:?}", report.outcome);
            };
            assert_eq!(failure.stage, stage, "{tool}");
            assert_eq!(report.outcome.exit_code(), status, "{tool}");
            assert_eq!(report.stages.len(), stage.ordinal(), "{tool}");
            assert!(!run.dir.path().join("adder.aag.gz").exists(), "{tool}");
        }
    }

    #[tokio::test]
    async fn test_e2e_trace_output_with_trailing_whitespace_passes() {
        let runner = MockToolRunner::certifying().with_behavior(
            ToolId::TraceChecker,
            MockBehavior::exit_code(0).with_stdout(format!("  {TRACE_CHECK_SUCCESS}\n\n")),
        );
        let (_run, report) = run_with(runner).await;
        assert_eq!(report.outcome, RunOutcome::Certified);
    }

    #[tokio::test]
    async fn test_e2e_trim_removes_intermediates() {
        let run = Run::new();
        let exec = executor(
            MockToolRunner::certifying(),
            ExecutorOptions {
                trim: true,
                ..ExecutorOptions::default()
            },
        );
        let report = exec.run(&run.paths, &CancelSignal::never()).await;
        assert_eq!(report.outcome, RunOutcome::Certified);

        let mut left: Vec<String> = std::fs::read_dir(&run.paths.workspace)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["tmp.cnf2".to_string()]);
    }

    /// Two runs side by side in distinct process-scoped workspaces
    #[tokio::test]
    async fn test_e2e_concurrent_runs_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tmp");
        let formula = dir.path().join("f.qdimacs");
        std::fs::write(&formula, "p cnf 1 1\ne 1 0\n1 0\n").unwrap();

        let first = Workspace::create_at(Workspace::path_for(&root, 101), CleanupPolicy::Never).unwrap();
        let second = Workspace::create_at(Workspace::path_for(&root, 202), CleanupPolicy::Never).unwrap();
        assert_ne!(first.dir(), second.dir());

        let paths_a = RunPaths::new(&formula, dir.path().join("a.aag"), first.dir());
        let paths_b = RunPaths::new(&formula, dir.path().join("b.aag"), second.dir());
        let exec_a = executor(MockToolRunner::certifying(), ExecutorOptions::default());
        let exec_b = executor(MockToolRunner::certifying(), ExecutorOptions::default());

        let never = CancelSignal::never();
        let (a, b) = tokio::join!(exec_a.run(&paths_a, &never), exec_b.run(&paths_b, &never));
        assert_eq!(a.outcome, RunOutcome::Certified);
        assert_eq!(b.outcome, RunOutcome::Certified);
        assert!(first.dir().join("tmp.cnf2").is_file());
        assert!(second.dir().join("tmp.cnf2").is_file());
    }

    /// Cancellation ends the run and still reaches teardown
    #[tokio::test]
    async fn test_e2e_cancel_then_teardown() {
        let dir = tempfile::tempdir().unwrap();
        let formula = dir.path().join("f.qdimacs");
        std::fs::write(&formula, "p cnf 1 1\ne 1 0\n1 0\n").unwrap();
        let workspace = Workspace::create_at(dir.path().join("tmp-7"), CleanupPolicy::Always).unwrap();
        let paths = RunPaths::new(&formula, dir.path().join("f.aag"), workspace.dir());

        let runner = MockToolRunner::certifying().with_behavior(
            ToolId::QbfSolver,
            MockBehavior::exit_code(20).delayed(Duration::from_secs(60)),
        );
        let exec = executor(runner, ExecutorOptions::default());
        let (handle, signal) = cancel_pair();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            handle.cancel("SIGTERM");
        });

        let report = exec.run(&paths, &signal).await;
        assert_eq!(report.outcome.exit_code(), -1);
        assert!(report.stages.is_empty());

        let dir_path = workspace.dir().to_path_buf();
        assert_eq!(workspace.finish(&report.outcome), Teardown::Removed);
        assert!(!dir_path.exists());
    }

    #[tokio::test]
    async fn test_e2e_timeout_is_stage_failure() {
        let run = Run::new();
        let runner = MockToolRunner::certifying().with_behavior(
            ToolId::FerpChecker,
            MockBehavior::exit_code(0).delayed(Duration::from_secs(60)),
        );
        let exec = executor(
            runner,
            ExecutorOptions {
                stage_timeout: Some(Duration::from_millis(25)),
                ..ExecutorOptions::default()
            },
        );
        let report = exec.run(&run.paths, &CancelSignal::never()).await;
        let RunOutcome::StageFailed(failure) = report.outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.cause, FailureCause::TimedOut);
        assert_eq!(failure.exit_code(), 7);
    }
}

#[cfg(all(test, unix))]
mod process_tests {
    use std::collections::BTreeMap;
    use std::io::Read;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use contracts::{FailureCause, RunOutcome, StageId, ToolId, ToolManifest};
    use stage_engine::{CancelSignal, ExecutorOptions, RunPaths, RunReport, StageExecutor};
    use toolchain::{check_dependencies, ProcessRunner};

    const QBF_SOLVER: &str = r#"for a in "$@"; do
  case "$a" in --log_phi=*) echo "p cnf 2 1" > "${a#--log_phi=}";; esac
done
exit 20"#;
    const PROOF_SAT: &str = r#"echo "1 -2 0" > "$2"; exit 20"#;
    const TRACE_CHECK: &str =
        r#"echo "binary" > "$2"; echo "resolved 1 root and 1 empty clause"; exit 0"#;
    const TRACE_MERGE: &str = r#"echo "ferp" > "$3""#;
    const FERP_CHECK: &str = "exit 0";
    const EXTRACT: &str = r#"echo "aag 1 1 0 1 0" > "$3""#;
    const MERGE: &str = r#"echo "p cnf 1 2"; echo "1 0"; echo "-1 0""#;
    const CERT_SAT: &str = r#"echo "s UNSATISFIABLE"; exit 20"#;

    struct Install {
        dir: tempfile::TempDir,
        manifest: ToolManifest,
    }

    fn install(overrides: &[(ToolId, &str)]) -> Install {
        let dir = tempfile::tempdir().unwrap();
        let manifest = ToolManifest::resolve(&dir.path().join("tools"), &BTreeMap::new());
        let defaults = [
            QBF_SOLVER, PROOF_SAT, TRACE_CHECK, TRACE_MERGE, FERP_CHECK, EXTRACT, MERGE, CERT_SAT,
        ];
        for (tool, body) in ToolId::ALL.into_iter().zip(defaults) {
            let body = overrides
                .iter()
                .find(|(id, _)| *id == tool)
                .map(|(_, b)| *b)
                .unwrap_or(body);
            write_script(manifest.path(tool), body);
        }
        Install { dir, manifest }
    }

    fn write_script(path: &Path, body: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    async fn certify(install: &Install, options: ExecutorOptions) -> (RunPaths, RunReport) {
        let formula = install.dir.path().join("f.qdimacs");
        std::fs::write(&formula, "p cnf 2 1\na 1 0\ne 2 0\n1 2 0\n").unwrap();
        let workspace: PathBuf = install.dir.path().join("tmp/tmp-1");
        std::fs::create_dir_all(&workspace).unwrap();
        let paths = RunPaths::new(formula, install.dir.path().join("out/f.aag"), workspace);
        std::fs::create_dir_all(install.dir.path().join("out")).unwrap();

        let exec = StageExecutor::new(
            ProcessRunner::new(),
            install.manifest.clone(),
            ExecutorOptions {
                announce: false,
                ..options
            },
        );
        let report = exec.run(&paths, &CancelSignal::never()).await;
        (paths, report)
    }

    #[test]
    fn test_preflight_sees_installed_scripts() {
        let install = install(&[]);
        assert!(check_dependencies(&install.manifest).all_present());

        std::fs::remove_file(install.manifest.path(ToolId::TraceMerger)).unwrap();
        let report = check_dependencies(&install.manifest);
        assert_eq!(report.missing(), vec![install.manifest.path(ToolId::TraceMerger)]);
    }

    #[tokio::test]
    async fn test_real_tools_certify() {
        let install = install(&[]);
        let (paths, report) = certify(&install, ExecutorOptions::default()).await;
        assert_eq!(report.outcome, RunOutcome::Certified);

        let merged = std::fs::read_to_string(paths.workspace.join("tmp.cnf2")).unwrap();
        assert_eq!(merged, "p cnf 1 2\n1 0\n-1 0\n");

        let gz = report.certificate.unwrap();
        let mut text = String::new();
        flate2::read::GzDecoder::new(std::fs::File::open(gz).unwrap())
            .read_to_string(&mut text)
            .unwrap();
        assert_eq!(text, "aag 1 1 0 1 0\n");
    }

    #[tokio::test]
    async fn test_real_solver_proves_true() {
        let install = install(&[(ToolId::QbfSolver, "exit 10")]);
        let (paths, report) = certify(&install, ExecutorOptions::default()).await;
        assert_eq!(report.outcome, RunOutcome::ProvedTrue);
        assert!(!paths.output.exists());
    }

    #[tokio::test]
    async fn test_real_trace_checker_mismatch() {
        let install = install(&[(
            ToolId::TraceChecker,
            r#"echo "binary" > "$2"; echo "resolved 1 root and 1 empty clause (partial)""#,
        )]);
        let (_, report) = certify(&install, ExecutorOptions::default()).await;
        let RunOutcome::StageFailed(failure) = report.outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.stage, StageId::ProofCheck);
        assert_eq!(failure.cause, FailureCause::UnexpectedOutput);
        assert_eq!(
            failure.detail.as_deref(),
            Some("resolved 1 root and 1 empty clause (partial)")
        );
    }

    #[tokio::test]
    async fn test_real_merged_formula_satisfiable() {
        let install = install(&[(ToolId::CertificateSatSolver, "exit 10")]);
        let (paths, report) = certify(&install, ExecutorOptions::default()).await;
        assert_eq!(report.outcome.exit_code(), 10);
        assert!(paths.output.exists());
    }

    #[tokio::test]
    async fn test_real_hung_tool_killed_on_timeout() {
        let install = install(&[(ToolId::FerpChecker, "sleep 30")]);
        let options = ExecutorOptions {
            stage_timeout: Some(Duration::from_secs(2)),
            ..ExecutorOptions::default()
        };
        let started = std::time::Instant::now();
        let (_, report) = certify(&install, options).await;
        assert!(started.elapsed() < Duration::from_secs(20));

        let RunOutcome::StageFailed(failure) = report.outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.stage, StageId::TraceValidate);
        assert_eq!(failure.cause, FailureCause::TimedOut);
    }

    #[tokio::test]
    async fn test_real_trim_keeps_pending_inputs() {
        let install = install(&[(ToolId::StrategyExtractor, "exit 1")]);
        let options = ExecutorOptions {
            trim: true,
            ..ExecutorOptions::default()
        };
        let (paths, report) = certify(&install, options).await;
        assert_eq!(report.outcome.exit_code(), 8);
        assert!(!paths.workspace.join("tmp.proof").exists());
        assert!(!paths.workspace.join("tmp.cnf").exists());
        assert!(!paths.workspace.join("tmp.proof2").exists());
        assert!(paths.workspace.join("tmp.ferp").exists());
    }
}
