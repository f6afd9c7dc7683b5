//! Whole runs of the compiler over the reference phases.

use {
    crate::{CompileError, Compiler, Outcome, Phases},
    anyhow::anyhow,
    firn_core::{
        log::CollectSink,
        options::{CompilePolicy, ImplicitSourcePolicy, Options, ProcMode},
        phase::{Processor, RoundEnvironment},
        state::CompileState,
        tree::SourceFile,
    },
    firn_phases::{
        Attr, CloseFlag, FlowAnalysis, Gen, Lower, MemoryFileManager,
        Modules, RoundProcessingEnvironment, SymbolEntry, ToyParser, Trace,
    },
    std::{cell::RefCell, collections::BTreeMap, rc::Rc},
};

struct Harness
{
    files: MemoryFileManager,
    trace: Trace,
    sink: CollectSink,
    compiler: Compiler,
}

impl Harness
{
    fn new(options: Options) -> Self
    {
        Self::with_entry(options, SymbolEntry::new)
    }

    fn with_entry(options: Options, entry: impl FnOnce(Trace) -> SymbolEntry)
        -> Self
    {
        let files = MemoryFileManager::default();
        let trace = Trace::default();
        let sink = CollectSink::default();
        let phases = Phases{
            parser: Box::new(ToyParser),
            modules: Box::new(Modules::default()),
            enter: Box::new(entry(trace.clone())),
            attribute: Box::new(Attr::new(trace.clone())),
            flow: Box::new(FlowAnalysis::new(trace.clone())),
            lowering: Box::new(Lower::new(trace.clone())),
            generate: Box::new(Gen::new(trace.clone())),
        };
        let compiler = Compiler::new(options, Box::new(sink.clone()),
                                     Box::new(files.clone()), phases);
        Self{files, trace, sink, compiler}
    }

    fn with_processing(mut self, processing: RoundProcessingEnvironment)
        -> Self
    {
        self.compiler =
            self.compiler.with_processing_environment(Box::new(processing));
        self
    }

    fn sources(&self, sources: &[(&str, &str)]) -> Vec<SourceFile>
    {
        sources.iter()
            .map(|&(path, text)| self.files.add_source(path, text))
            .collect()
    }

    fn compile(&mut self, sources: &[(&str, &str)])
        -> Result<Outcome, CompileError>
    {
        let files = self.sources(sources);
        self.compiler.compile(&files, &[], None, &[])
    }

    fn outputs(&self) -> Vec<String>
    {
        self.files.output_paths().iter()
            .map(|path| path.display().to_string())
            .collect()
    }

    fn state(&self, class: &str) -> Option<CompileState>
    {
        let cx = self.compiler.context();
        cx.symtab.env(class).and_then(|env| cx.compile_states.get(env))
    }
}

fn policy(compile_policy: CompilePolicy) -> Options
{
    Options{compile_policy, ..Options::default()}
}

/* -------------------------------------------------------------------------- */
/*                                  Pipeline                                  */
/* -------------------------------------------------------------------------- */

#[test]
fn single_class()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[("A.java", "class A { field x; }")]).unwrap();
    assert_eq!(outcome, Outcome::Success{warnings: 0});

    let phases: Vec<_> = h.trace.events().iter().map(|e| e.phase).collect();
    assert_eq!(phases, ["enter", "attribute", "flow", "trans_types",
                        "trans_patterns", "lower", "generate"]);
    assert_eq!(h.outputs(), ["out/A.class"]);
    assert_eq!(h.compiler.generated().len(), 1);
    assert_eq!(h.state("A"), Some(CompileState::Lower));
    assert!(h.files.is_closed());
    assert_eq!(h.files.flush_count(), 1);
    assert!(h.sink.codes().is_empty());
    assert_eq!(h.sink.summary(), Some((0, 0)));
}

#[test]
fn lambda_lowering_only_for_classes_with_lambdas()
{
    let mut h = Harness::new(Options::default());
    h.compile(&[
        ("A.java", "class A { method m { lambda { } } }"),
        ("B.java", "class B { method m { } }"),
        ("C.java", "class C { ref A::m; }"),
    ]).unwrap();
    assert_eq!(h.trace.classes("lambda_to_method"), ["A", "C"]);
    assert_eq!(h.trace.classes("lower"), ["A", "B", "C"]);
    let image = h.files.output_text("out/A.class").unwrap();
    assert!(image.contains("method lambda$0"));
}

#[test]
fn ancestors_are_lowered_first()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[
        ("C.java", "class C extends B { }"),
        ("B.java", "class B extends A { }"),
        ("A.java", "class A { }"),
    ]).unwrap();
    assert!(outcome.is_success());

    assert_eq!(h.trace.classes("lower"), ["A", "B", "C"]);
    for class in ["A", "B", "C"] {
        assert_eq!(h.trace.count("attribute", class), 1);
        assert_eq!(h.trace.count("flow", class), 1);
        assert_eq!(h.trace.count("lower", class), 1);
        assert_eq!(h.state(class), Some(CompileState::Lower));
    }
    let position = |phase, class| h.trace.position(phase, class).unwrap();
    assert!(position("flow", "B") < position("trans_types", "C"));
    assert!(position("flow", "A") < position("trans_types", "B"));

    // Classes are generated in queue order, the forced ones from the cache.
    assert_eq!(h.outputs(), ["out/C.class", "out/B.class", "out/A.class"]);
}

#[test]
fn nested_ancestors_force_their_outermost_class()
{
    let mut h = Harness::new(Options::default());
    h.compile(&[
        ("B.java", "class B { class Inner extends A$Base { } }"),
        ("A.java", "class A { class Base { } }"),
    ]).unwrap();
    assert_eq!(h.trace.classes("lower"), ["A", "B"]);
    assert_eq!(h.outputs(), ["out/B.class", "out/B$Inner.class",
                             "out/A.class", "out/A$Base.class"]);
}

#[test]
fn cyclic_hierarchy_terminates()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[
        ("A.java", "class A extends B { } class B extends A { }"),
    ]).unwrap();
    assert!(outcome.is_success());
    assert_eq!(h.trace.count("lower", "A"), 1);
    assert_eq!(h.trace.count("lower", "B"), 1);
    assert_eq!(h.outputs(), ["out/A.class", "out/B.class"]);
}

#[test]
fn duplicate_inputs_are_parsed_once()
{
    let mut h = Harness::new(Options::default());
    let files = h.sources(&[("A.java", "class A { }")]);
    let files = [files[0].clone(), files[0].clone()];
    h.compiler.compile(&files, &[], None, &[]).unwrap();
    assert_eq!(h.trace.count("enter", "A"), 1);
    assert_eq!(h.outputs(), ["out/A.class"]);
}

#[test]
fn unreadable_file()
{
    let mut h = Harness::new(Options::default());
    let files = [SourceFile::new("Missing.java")];
    let outcome = h.compiler.compile(&files, &[], None, &[]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["error.reading.file"]);
}

#[test]
fn syntax_error_stops_before_entering()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[
        ("A.java", "class A { field }"),
        ("B.java", "class B { }"),
    ]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert!(h.trace.classes("enter").is_empty());
    assert_eq!(h.sink.codes(), ["compiler.err.syntax"]);
    assert_eq!(h.sink.summary(), Some((1, 0)));
}

/* -------------------------------------------------------------------------- */
/*                                 Stop policy                                */
/* -------------------------------------------------------------------------- */

#[test]
fn attribution_continues_after_errors_by_default()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[
        ("A.java", "class A { error; }"),
        ("B.java", "class B { }"),
    ]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.trace.classes("attribute"), ["A", "B"]);
    assert!(h.trace.classes("post_attr").is_empty());
    assert!(h.trace.classes("flow").is_empty());
    assert!(h.outputs().is_empty());
}

#[test]
fn stop_if_error_at_attr_runs_post_attribution()
{
    let mut h = Harness::new(Options{
        should_stop_if_error: CompileState::Attr,
        ..Options::default()
    });
    h.compile(&[
        ("A.java", "class A { error; }"),
        ("B.java", "class B { }"),
    ]).unwrap();
    assert_eq!(h.trace.classes("attribute"), ["A", "B"]);
    assert_eq!(h.trace.classes("post_attr"), ["A", "B"]);
    assert!(h.trace.classes("flow").is_empty());
    assert_eq!(h.state("A"), Some(CompileState::Attr));
    assert_eq!(h.state("B"), Some(CompileState::Attr));
}

#[test]
fn stop_if_error_at_flow_analyzes_but_does_not_lower()
{
    let mut h = Harness::new(Options{
        should_stop_if_error: CompileState::Flow,
        ..Options::default()
    });
    h.compile(&[("A.java", "class A { error; unreachable; }")]).unwrap();
    assert_eq!(h.trace.classes("flow"), ["A"]);
    assert!(h.trace.classes("trans_types").is_empty());
    assert_eq!(h.sink.codes(), ["error.requested", "unreachable.stmt"]);
}

#[test]
fn stop_if_no_error()
{
    let mut h = Harness::new(Options{
        should_stop_if_no_error: CompileState::Flow,
        ..Options::default()
    });
    let outcome = h.compile(&[("A.java", "class A { }")]).unwrap();
    assert!(outcome.is_success());
    assert_eq!(h.trace.classes("flow"), ["A"]);
    assert!(h.trace.classes("trans_types").is_empty());
    assert!(h.outputs().is_empty());

    let mut h = Harness::new(Options{
        should_stop_if_no_error: CompileState::Process,
        ..Options::default()
    });
    h.compile(&[("A.java", "class A { }")]).unwrap();
    assert_eq!(h.trace.classes("enter"), ["A"]);
    assert!(h.trace.classes("attribute").is_empty());
}

#[test]
fn warnings_as_errors()
{
    let mut h = Harness::new(Options{werror: true, ..Options::default()});
    let outcome = h.compile(&[("A.java", "class A { warn; }")]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 1});
    assert_eq!(h.sink.codes(), ["warn.requested", "warnings.and.werror"]);
    assert!(h.outputs().is_empty());
}

#[test]
fn warnings_alone_succeed()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[("A.java", "class A { warn; }")]).unwrap();
    assert_eq!(outcome, Outcome::Success{warnings: 1});
    assert_eq!(h.outputs(), ["out/A.class"]);
}

#[test]
fn errors_over_the_limit_still_stop_compilation()
{
    let mut h = Harness::new(Options{max_errors: 0, ..Options::default()});
    let outcome = h.compile(&[("A.java", "class A { error; }")]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert!(h.sink.codes().is_empty());
    assert_eq!(h.sink.summary(), Some((1, 0)));
    assert!(h.trace.classes("flow").is_empty());
    assert!(h.outputs().is_empty());
}

#[test]
fn warnings_as_errors_over_the_limit()
{
    let mut h = Harness::new(Options{
        werror: true,
        max_errors: 0,
        ..Options::default()
    });
    let outcome = h.compile(&[("A.java", "class A { warn; }")]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 1});
    assert_eq!(h.sink.codes(), ["warn.requested"]);
    assert_eq!(h.compiler.context().log.suppressed_counts(), (1, 0));
    assert!(h.outputs().is_empty());
}

#[test]
fn warnings_over_the_limit_are_counted()
{
    let mut h = Harness::new(Options{max_warnings: 1, ..Options::default()});
    let outcome = h.compile(&[("A.java", "class A { warn; warn; }")]).unwrap();
    assert_eq!(outcome, Outcome::Success{warnings: 2});
    assert_eq!(h.sink.codes(), ["warn.requested"]);
    assert_eq!(h.sink.summary(), Some((0, 2)));
    assert_eq!(h.outputs(), ["out/A.class"]);
}

/* -------------------------------------------------------------------------- */
/*                               Compile policies                             */
/* -------------------------------------------------------------------------- */

#[test]
fn policies_produce_the_same_classes()
{
    let sources = [
        ("A.java", "class A { method m { lambda { use B; } } }"),
        ("B.java", "class B extends A { class Inner { field x; } }"),
        ("C.java", "class C extends B { ref A::m; }"),
    ];
    let outputs = |compile_policy| {
        let mut h = Harness::new(policy(compile_policy));
        let outcome = h.compile(&sources).unwrap();
        assert!(outcome.is_success(), "{compile_policy}");
        h.outputs().into_iter()
            .map(|path| {
                let image = h.files.output(&path).unwrap();
                (path, image)
            })
            .collect::<BTreeMap<_, _>>()
    };
    let simple = outputs(CompilePolicy::Simple);
    assert_eq!(simple.len(), 4);
    assert!(simple.contains_key("out/B$Inner.class"));
    assert_eq!(outputs(CompilePolicy::ByFile), simple);
    assert_eq!(outputs(CompilePolicy::ByTodo), simple);
}

#[test]
fn simple_policy_runs_each_phase_over_everything()
{
    let mut h = Harness::new(policy(CompilePolicy::Simple));
    h.compile(&[("A.java", "class A { }"), ("B.java", "class B { }")]).unwrap();
    let phases: Vec<_> =
        h.trace.events().iter()
        .filter(|e| e.phase != "enter")
        .map(|e| format!("{} {}", e.phase, e.class))
        .collect();
    assert_eq!(phases, [
        "attribute A", "attribute B",
        "flow A", "flow B",
        "trans_types A", "trans_patterns A", "lower A",
        "trans_types B", "trans_patterns B", "lower B",
        "generate A", "generate B",
    ]);
}

#[test]
fn error_in_later_file()
{
    let sources = [("A.java", "class A { }"), ("B.java", "class B { error; }")];
    let run = |compile_policy| {
        let mut h = Harness::new(policy(compile_policy));
        let outcome = h.compile(&sources).unwrap();
        assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
        h.outputs()
    };
    // Whole-queue attribution finds the error before anything is generated.
    assert!(run(CompilePolicy::Simple).is_empty());
    assert_eq!(run(CompilePolicy::ByFile), ["out/A.class"]);
    assert_eq!(run(CompilePolicy::ByTodo), ["out/A.class"]);
}

#[test]
fn error_in_earlier_file()
{
    let sources = [("A.java", "class A { error; }"), ("B.java", "class B { }")];
    let run = |compile_policy| {
        let mut h = Harness::new(policy(compile_policy));
        h.compile(&sources).unwrap();
        assert!(h.outputs().is_empty());
        h.trace.classes("attribute")
    };
    assert_eq!(run(CompilePolicy::Simple), ["A", "B"]);
    assert_eq!(run(CompilePolicy::ByFile), ["A"]);
    assert_eq!(run(CompilePolicy::ByTodo), ["A", "B"]);
}

#[test]
fn by_file_keeps_classes_of_a_file_together()
{
    let mut h = Harness::new(policy(CompilePolicy::ByFile));
    h.compile(&[
        ("A.java", "class A1 { } class A2 { }"),
        ("B.java", "class B { }"),
    ]).unwrap();
    let position = |phase, class| h.trace.position(phase, class).unwrap();
    assert!(position("attribute", "A2") < position("flow", "A1"));
    assert!(position("generate", "A2") < position("attribute", "B"));
}

/* -------------------------------------------------------------------------- */
/*                                Implicit files                              */
/* -------------------------------------------------------------------------- */

fn implicit(policy: Option<ImplicitSourcePolicy>) -> Harness
{
    let mut h = Harness::new(Options{implicit: policy, ..Options::default()});
    h.files.add_source_path("B", "class B { }");
    let outcome = h.compile(&[("A.java", "class A extends B { }")]).unwrap();
    assert!(outcome.is_success());
    h
}

#[test]
fn implicit_sources_are_compiled()
{
    let h = implicit(None);
    assert_eq!(h.outputs(), ["out/A.class", "out/B.class"]);
}

#[test]
fn implicit_none_compiles_only_inputs()
{
    let h = implicit(Some(ImplicitSourcePolicy::None));
    assert_eq!(h.outputs(), ["out/A.class"]);
    // The superclass is still analyzed before its subclass is lowered.
    assert_eq!(h.trace.classes("flow"), ["A", "B"]);
    assert!(h.trace.position("flow", "B") < h.trace.position("lower", "A"));
    assert_eq!(h.trace.classes("lower"), ["A"]);
}

#[test]
fn classpath_superclasses_are_not_forced()
{
    let mut h = Harness::with_entry(Options::default(), |trace| {
        SymbolEntry::new(trace).with_classpath_class("Object")
    });
    let outcome = h.compile(&[("A.java", "class A extends Object { }")]).unwrap();
    assert!(outcome.is_success());
    assert_eq!(h.trace.classes("attribute"), ["A"]);
}

/* -------------------------------------------------------------------------- */
/*                                Source output                               */
/* -------------------------------------------------------------------------- */

#[test]
fn print_source()
{
    let mut h = Harness::new(Options{print_source: true, ..Options::default()});
    h.compile(&[(
        "A.java",
        "class A { class B { } method m { lambda { } } }",
    )]).unwrap();
    assert!(h.trace.classes("lower").is_empty());
    assert!(h.trace.classes("generate").is_empty());
    assert_eq!(h.outputs(), ["out/A.java"]);
    assert_eq!(h.files.output_text("out/A.java").unwrap(), "\
        class A {\n    \
            class B {\n    \
            }\n    \
            method m {\n        \
                invokedynamic;\n    \
            }\n    \
            method lambda$0 {\n    \
            }\n\
        }\n");
}

#[test]
fn print_source_never_overwrites_inputs()
{
    let mut h = Harness::new(Options{print_source: true, ..Options::default()});
    let outcome = h.compile(&[("out/A.java", "class A { }")]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["source.cant.overwrite.input.file"]);
    assert!(h.outputs().is_empty());
}

#[test]
fn write_failure()
{
    let mut h = Harness::new(Options::default());
    h.files.fail_writes();
    let outcome = h.compile(&[("A.java", "class A { } class B { }")]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["class.cant.write"]);
    assert!(h.compiler.generated().is_empty());
}

#[test]
fn code_too_large()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[("A.java", "class A { toolarge; }")]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["limit.code"]);
    assert!(h.outputs().is_empty());
}

/* -------------------------------------------------------------------------- */
/*                                   Failures                                 */
/* -------------------------------------------------------------------------- */

#[test]
fn completion_failure_is_reported_and_compilation_continues()
{
    let mut h = Harness::new(Options::default());
    let outcome = h.compile(&[
        ("A.java", "class A { incomplete; }"),
        ("B.java", "class B { }"),
    ]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["cant.access"]);
    assert_eq!(h.trace.classes("attribute"), ["A", "B"]);
}

#[test]
fn resource_exhaustion()
{
    let mut h = Harness::new(Options::default());
    let result = h.compile(&[("A.java", "class A { exhaust; }")]);
    assert!(matches!(result, Err(CompileError::ResourceExhausted(..))));
    assert_eq!(h.sink.codes(), ["compiler.err.resource.exhausted"]);
    assert!(h.trace.classes("generate").is_empty());
    assert!(h.compiler.generated().is_empty());
    assert!(h.outputs().is_empty());
    assert!(h.files.is_closed());
    assert_eq!(h.files.flush_count(), 1);
}

#[test]
fn internal_error()
{
    let mut h = Harness::new(Options::default());
    let result = h.compile(&[("A.java", "class A { crash; }")]);
    assert!(matches!(result, Err(CompileError::Internal(..))));
    assert_eq!(h.sink.codes(), ["compiler.err.bug"]);
    assert!(h.files.is_closed());
}

#[test]
fn internal_error_after_errors_is_not_reported_again()
{
    let mut h = Harness::new(Options{
        should_stop_if_error: CompileState::Attr,
        ..Options::default()
    });
    let result = h.compile(&[
        ("A.java", "class A { error; }"),
        ("B.java", "class B { crash; }"),
    ]);
    assert!(matches!(result, Err(CompileError::Internal(..))));
    assert_eq!(h.sink.codes(), ["error.requested"]);
}

#[test]
fn panic_becomes_internal_error()
{
    let mut h = Harness::new(Options::default());
    let result = h.compile(&[("A.java", "class A { panic; }")]);
    match result {
        Err(CompileError::Internal(error)) =>
            assert!(error.to_string().contains("panic requested in A")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(h.files.is_closed());
}

#[test]
fn compiler_cannot_be_reused()
{
    let mut h = Harness::new(Options::default());
    h.compile(&[("A.java", "class A { }")]).unwrap();
    assert!(matches!(h.compile(&[]), Err(CompileError::Reused)));
    assert!(h.compiler.close().is_ok());
    assert_eq!(h.files.flush_count(), 1);
}

#[test]
fn closeables_are_all_closed()
{
    let mut h = Harness::new(Options::default());
    let flags = [
        CloseFlag::failing("first"),
        CloseFlag::default(),
        CloseFlag::failing("last"),
    ];
    for flag in &flags {
        h.compiler.register_closeable(Box::new(flag.clone()));
    }
    match h.compile(&[("A.java", "class A { }")]) {
        Err(CompileError::Close(error)) => assert_eq!(error.to_string(), "last"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(flags.iter().all(CloseFlag::is_closed));
    assert_eq!(h.outputs(), ["out/A.class"]);
}

#[test]
fn extra_root_modules()
{
    let mut h = Harness::new(Options::default());
    let files = h.sources(&[("A.java", "module m; class A { }")]);
    let outcome =
        h.compiler.compile(&files, &[], None, &["m".into(), "ghost".into()])
        .unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["module.not.found"]);
}

/* -------------------------------------------------------------------------- */
/*                            Annotation processing                           */
/* -------------------------------------------------------------------------- */

type Rounds = Rc<RefCell<Vec<(usize, Vec<String>, bool)>>>;

/// Processor that records its rounds and generates sources on request.
#[derive(Clone, Default)]
struct Recorder
{
    rounds: Rounds,
    generate: Vec<(usize, &'static str, &'static str)>,
    fail: bool,
}

impl Recorder
{
    fn generating(round: usize, class: &'static str, text: &'static str)
        -> Self
    {
        Self{generate: vec![(round, class, text)], ..Self::default()}
    }

    fn boxed(&self) -> Option<Vec<Box<dyn Processor>>>
    {
        Some(vec![Box::new(self.clone()) as Box<dyn Processor>])
    }
}

impl Processor for Recorder
{
    fn name(&self) -> &str
    {
        "recorder"
    }

    fn process(&mut self, round: &mut RoundEnvironment) -> anyhow::Result<()>
    {
        let roots = round.root_classes.iter().map(|c| c.to_string()).collect();
        self.rounds.borrow_mut()
            .push((round.number, roots, round.processing_over));
        if self.fail {
            return Err(anyhow!("boom"));
        }
        for &(number, class, text) in &self.generate {
            if number == round.number {
                round.generate_source(class, text);
            }
        }
        Ok(())
    }
}

fn processing(options: Options) -> Harness
{
    Harness::new(options).with_processing(RoundProcessingEnvironment::new())
}

#[test]
fn generated_superclass()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::generating(1, "Gen", "class Gen { field g; }");
    let files = h.sources(&[("A.java", "class A extends Gen { }")]);
    let outcome = h.compiler.compile(&files, &[], recorder.boxed(), &[]).unwrap();

    assert_eq!(outcome, Outcome::Success{warnings: 0});
    assert!(h.sink.codes().is_empty());
    assert!(h.compiler.annotation_processing_occurred());
    assert_eq!(*recorder.rounds.borrow(), [
        (1, vec!["A".to_owned()], false),
        (2, vec!["Gen".to_owned()], false),
        (3, vec![], true),
    ]);
    assert_eq!(h.outputs(), ["gen/Gen.java", "out/A.class", "out/Gen.class"]);
    assert!(h.trace.position("lower", "Gen") < h.trace.position("lower", "A"));
}

#[test]
fn missing_superclass_is_reported_once_after_processing()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::default();
    let files = h.sources(&[("A.java", "class A extends Missing { }")]);
    let outcome = h.compiler.compile(&files, &[], recorder.boxed(), &[]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["cant.resolve"]);
    assert_eq!(recorder.rounds.borrow().len(), 2);
}

#[test]
fn unrecoverable_error_in_generated_source_aborts()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::generating(1, "Bad", "class Bad {");
    let files = h.sources(&[("A.java", "class A { }")]);
    let outcome = h.compiler.compile(&files, &[], recorder.boxed(), &[]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["compiler.err.syntax"]);
    assert!(h.trace.classes("attribute").is_empty());
    assert_eq!(h.outputs(), ["gen/Bad.java"]);
}

#[test]
fn regenerating_an_input_is_an_error()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::generating(1, "A", "class A { }");
    let files = h.sources(&[("A.java", "class A { }")]);
    let outcome = h.compiler.compile(&files, &[], recorder.boxed(), &[]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["proc.type.recreate"]);
}

#[test]
fn sources_generated_in_the_last_round_are_not_processed()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::generating(2, "Late", "class Late { }");
    let files = h.sources(&[("A.java", "class A { }")]);
    let outcome = h.compiler.compile(&files, &[], recorder.boxed(), &[]).unwrap();
    assert_eq!(outcome, Outcome::Success{warnings: 1});
    assert_eq!(h.sink.codes(), ["proc.file.create.last.round"]);
    assert_eq!(h.outputs(), ["out/A.class"]);
}

#[test]
fn processor_failure()
{
    let mut h = processing(Options::default());
    let recorder = Recorder{fail: true, ..Recorder::default()};
    let files = h.sources(&[("A.java", "class A { }")]);
    let result = h.compiler.compile(&files, &[], recorder.boxed(), &[]);
    assert!(matches!(result, Err(CompileError::Processing(..))));
    assert!(h.outputs().is_empty());
    assert!(h.files.is_closed());
}

#[test]
fn implicit_processing_is_noted()
{
    let recorder = Recorder::default();
    let processing = RoundProcessingEnvironment::new()
        .with_discoverable(Box::new(recorder.clone()));
    let mut h = Harness::new(Options::default()).with_processing(processing);
    let outcome = h.compile(&[("A.java", "class A { }")]).unwrap();
    assert!(outcome.is_success());
    assert_eq!(h.sink.codes(), ["implicit.annotation.processing"]);
    assert!(h.compiler.annotation_processing_occurred());
    assert_eq!(recorder.rounds.borrow().len(), 2);
}

#[test]
fn proc_none_disables_processing()
{
    let recorder = Recorder::default();
    let processing = RoundProcessingEnvironment::new()
        .with_discoverable(Box::new(recorder.clone()));
    let mut h = Harness::new(Options{
        proc: Some(ProcMode::None),
        ..Options::default()
    }).with_processing(processing);
    h.compile(&[("A.java", "class A { }")]).unwrap();
    assert!(recorder.rounds.borrow().is_empty());
    assert!(!h.compiler.annotation_processing_occurred());
    assert_eq!(h.outputs(), ["out/A.class"]);
}

#[test]
fn proc_only_stops_after_processing()
{
    let mut h = processing(Options{
        proc: Some(ProcMode::Only),
        ..Options::default()
    });
    let recorder = Recorder::default();
    let files = h.sources(&[("A.java", "class A { }")]);
    h.compiler.compile(&files, &[], recorder.boxed(), &[]).unwrap();
    assert_eq!(recorder.rounds.borrow().len(), 2);
    assert!(h.trace.classes("attribute").is_empty());
    assert!(h.outputs().is_empty());
}

#[test]
fn proc_only_without_processors()
{
    let mut h = Harness::new(Options{
        proc: Some(ProcMode::Only),
        ..Options::default()
    });
    let outcome = h.compile(&[("A.java", "class A { }")]).unwrap();
    assert_eq!(outcome, Outcome::Success{warnings: 1});
    assert_eq!(h.sink.codes(), ["proc.proc-only.requested.no.procs"]);
    assert!(h.trace.classes("attribute").is_empty());
}

#[test]
fn class_names_require_explicit_processing()
{
    let mut h = Harness::new(Options::default());
    let files = h.sources(&[("A.java", "class A { }")]);
    let outcome =
        h.compiler.compile(&files, &["A".to_owned()], None, &[]).unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(),
               ["proc.no.explicit.annotation.processing.requested"]);
}

#[test]
fn class_names_are_processed()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::default();
    let files = h.sources(&[("A.java", "module m; class A { }")]);
    let outcome = h.compiler
        .compile(&files, &["m/A".to_owned()], recorder.boxed(), &[])
        .unwrap();
    assert!(outcome.is_success());
    assert!(h.sink.codes().is_empty());
    assert_eq!(recorder.rounds.borrow()[0].1, ["A", "A"]);
}

#[test]
fn package_names_are_processed()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::default();
    let files = h.sources(&[
        ("A.java", "class A { }"),
        ("B.java", "package p; class C { } class B { }"),
    ]);
    h.compiler.compile(&files, &["p".to_owned()], recorder.boxed(), &[])
        .unwrap();
    assert_eq!(recorder.rounds.borrow()[0].1, ["A", "C", "B", "B", "C"]);
}

#[test]
fn unknown_class_name()
{
    let mut h = processing(Options::default());
    let recorder = Recorder::default();
    let files = h.sources(&[("A.java", "class A { }")]);
    let outcome = h.compiler
        .compile(&files, &["Nope".to_owned()], recorder.boxed(), &[])
        .unwrap();
    assert_eq!(outcome, Outcome::Failed{errors: 1, warnings: 0});
    assert_eq!(h.sink.codes(), ["proc.cant.find.class"]);
    assert!(recorder.rounds.borrow().is_empty());
}
