// tests/flow_execution_tests.rs
mod common;

use common::*;
use serial_test::serial;
use std::sync::Arc;
use stepflow::{Flow, FlowData, FlowError, FlowOutcome, StepControl};

#[tokio::test]
#[serial]
async fn test_flow_runs_steps_in_order() {
  setup_tracing();
  let mut flow =
    Flow::<TestContext, TestError>::new(&[("step1", false, None), ("step2", false, None), ("step3", false, None)]);

  flow.on("step1", create_simple_handler("step1", " S1"));
  flow.on("step2", create_simple_handler("step2", " S2"));
  flow.on("step3", create_simple_handler("step3", " S3"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert!(result.is_ok());
  assert_eq!(result.unwrap(), FlowOutcome::Completed);

  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_flow_halts_on_step_control_halt() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[
    ("stepA", false, None),
    ("haltStep", false, None),
    ("stepC", false, None),
  ]);

  flow.on("stepA", create_simple_handler("stepA", "A"));
  flow.on("haltStep", |ctx: FlowData<TestContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("haltStep".to_string());
      Ok::<StepControl, FlowError>(StepControl::Halt)
    })
  });
  flow.on("stepC", create_simple_handler("stepC", "C")); // Must not run

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert!(result.is_ok());
  assert_eq!(result.unwrap(), FlowOutcome::Halted);

  let guard = ctx.read();
  assert_eq!(guard.counter, 1); // Only stepA incremented
  assert_eq!(guard.message, "A");
  assert_eq!(guard.steps_executed, vec!["stepA", "haltStep"]);
}

#[tokio::test]
#[serial]
async fn test_flow_propagates_handler_error() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("another_step", false, None),
  ]);

  flow.on("good_step", create_simple_handler("good_step", "Good"));
  flow.on("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  flow.on("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert!(result.is_err());
  match result.err().unwrap() {
    TestError::Handler(msg) => assert_eq!(msg, "I am a bad step!"),
    _ => panic!("Expected TestError::Handler"),
  }

  let guard = ctx.read();
  assert_eq!(guard.counter, 1); // Only good_step incremented
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_flow_skips_step_if_condition_met() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[
    ("step1", false, None),
    (
      "step_to_skip",
      false,
      Some(Arc::new(|ctx: FlowData<TestContext>| ctx.read().counter > 0)),
    ),
    ("step3", false, None),
  ]);

  flow.on("step1", create_simple_handler("step1", " S1"));
  flow.on("step_to_skip", create_simple_handler("step_to_skip", " SKIPPED"));
  flow.on("step3", create_simple_handler("step3", " S3"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 2); // step1 and step3 ran
  assert_eq!(guard.message, " S1 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_non_optional_step_without_handler_errors() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("step1", false, None), ("naked_step", false, None)]);
  flow.on("step1", create_simple_handler("step1", " S1"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert!(result.is_err());
  match result.err().unwrap() {
    TestError::Flow(msg) => assert!(msg.contains("naked_step"), "unexpected error detail: {}", msg),
    other => panic!("Expected TestError::Flow, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_optional_step_without_handler_is_skipped() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("step1", false, None), ("optional_naked", true, None)]);
  flow.on("step1", create_simple_handler("step1", " S1"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["step1"]);
}

#[tokio::test]
#[serial]
async fn test_multiple_handlers_on_one_step_run_in_registration_order() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("multi", false, None)]);

  flow.on("multi", create_simple_handler("multi", " first"));
  flow.on("multi", create_simple_handler("multi", " second"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Completed);
  let guard = ctx.read();
  assert_eq!(guard.counter, 2);
  assert_eq!(guard.message, " first second");
}

#[tokio::test]
#[serial]
async fn test_insert_and_remove_steps() {
  setup_tracing();
  let mut flow = Flow::<TestContext, TestError>::new(&[("step1", false, None), ("step3", false, None)]);
  flow.insert_after_step("step1", "step2", false, None);
  flow.remove_step("step3");

  flow.on("step1", create_simple_handler("step1", " S1"));
  flow.on("step2", create_simple_handler("step2", " S2"));

  let ctx = FlowData::new(TestContext::default());
  let result = flow.run(ctx.clone()).await;

  assert_eq!(result.unwrap(), FlowOutcome::Completed);
  assert_eq!(ctx.read().steps_executed, vec!["step1", "step2"]);
}
