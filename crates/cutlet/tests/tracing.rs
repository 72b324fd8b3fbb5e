//! The evaluation tracing hook.

use cutlet::{CollectPrint, Interpreter, NodeKind, RecordingTracer};

#[test]
fn recording_tracer_sees_every_node() {
    let tracer = RecordingTracer::new();
    let events = tracer.events();

    let mut interp = Interpreter::with_output(Box::new(CollectPrint::new()));
    interp.set_tracer(Box::new(tracer));
    interp
        .run("local x = 1\nprint \"x is $x\"\n")
        .expect("script runs cleanly");

    let events = events.borrow();
    let kinds: Vec<NodeKind> = events.iter().map(|(kind, _)| *kind).collect();
    assert!(kinds.contains(&NodeKind::Block));
    assert!(kinds.contains(&NodeKind::Command));
    assert!(kinds.contains(&NodeKind::Value));
    assert!(kinds.contains(&NodeKind::StringInterp));
    assert!(kinds.contains(&NodeKind::Variable));
}

#[test]
fn node_kind_names_are_stable() {
    // Hosts key debugger displays off these names.
    assert_eq!(NodeKind::Block.to_string(), "Block");
    assert_eq!(NodeKind::Command.to_string(), "Command");
    assert_eq!(NodeKind::Value.to_string(), "Value");
    assert_eq!(NodeKind::Variable.to_string(), "Variable");
    assert_eq!(NodeKind::StringInterp.to_string(), "StringInterp");
    assert_eq!(NodeKind::Comment.to_string(), "Comment");
}

#[test]
fn trace_locations_are_byte_offsets() {
    let tracer = RecordingTracer::new();
    let events = tracer.events();

    let mut interp = Interpreter::with_output(Box::new(CollectPrint::new()));
    interp.set_tracer(Box::new(tracer));
    interp.run("print one\nprint two\n").expect("script runs cleanly");

    let events = events.borrow();
    // The second command's head starts after "print one\n".
    assert!(events
        .iter()
        .any(|(kind, loc)| *kind == NodeKind::Command && loc.offset == 10));
}
