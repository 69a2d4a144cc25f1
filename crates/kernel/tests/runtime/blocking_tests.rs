use super::*;

#[tokio::test]
async fn run_blocking_should_return_value() {
    let result = run_blocking("sum", || Ok::<_, AppError>(1 + 2))
        .await
        .expect("run blocking success");
    assert_eq!(result, 3);
}

#[tokio::test]
async fn run_blocking_should_map_inner_error() {
    let result = run_blocking::<(), _>("inner_error", || {
        Err(AppError::new("inner", "inner failure"))
    })
    .await;

    assert_eq!(result.expect_err("expect err").code, "inner");
}

#[tokio::test]
async fn run_blocking_should_map_panic_error() {
    let result = run_blocking::<(), _>("panic_case", || panic!("panic in blocking job")).await;
    let error = result.expect_err("expect panic mapping");
    assert_eq!(error.code, "blocking_task_panicked");
    assert_eq!(error.context_value("blockingTask"), Some("panic_case"));
}

#[tokio::test]
async fn fan_out_blocking_should_wait_for_every_item() {
    let mut outputs = fan_out_blocking("square", (1..=8u64).collect(), |value| value * value).await;
    outputs.sort_unstable();
    assert_eq!(outputs, vec![1, 4, 9, 16, 25, 36, 49, 64]);
}

#[tokio::test]
async fn fan_out_blocking_should_skip_panicking_items() {
    let mut outputs = fan_out_blocking("partial", vec![1u32, 2, 3], |value| {
        if value == 2 {
            panic!("root worker failed");
        }
        value
    })
    .await;
    outputs.sort_unstable();
    assert_eq!(outputs, vec![1, 3]);
}

#[tokio::test]
async fn fan_out_blocking_should_handle_empty_input() {
    let outputs = fan_out_blocking("empty", Vec::<u8>::new(), |value| value).await;
    assert!(outputs.is_empty());
}
