mod support;

use cedar_qa_e2e::actions::{listbox_selectors, option_selectors};
use cedar_qa_e2e::{DialogAction, Driver, E2eError, SwitchState, UiActions};
use std::sync::Arc;
use std::time::Duration;
use support::{unfiltered, FakeDriver, FakeElement};

fn actions_for(driver: &Arc<FakeDriver>) -> UiActions {
    UiActions::new(driver.clone())
}

#[tokio::test]
async fn click_missing_element_fails_without_touching_driver() {
    let driver = Arc::new(FakeDriver::new());
    let actions = actions_for(&driver);

    let err = actions.click("#missing").await.unwrap_err();
    match err {
        E2eError::ElementNotFound { selector } => assert_eq!(selector, "#missing"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(driver.calls_starting_with("click:"), 0);
}

#[tokio::test]
async fn fill_skips_none_and_fills_some() {
    let driver = Arc::new(FakeDriver::new().with_element("#email", FakeElement::visible()));
    let actions = actions_for(&driver);

    actions.fill("#email", None).await.unwrap();
    assert!(driver.calls().is_empty());

    actions.fill("#email", Some("qa@cedar.test")).await.unwrap();
    assert_eq!(driver.value_of("#email").as_deref(), Some("qa@cedar.test"));
}

#[tokio::test]
async fn fill_missing_element_is_not_found() {
    let driver = Arc::new(FakeDriver::new());
    let err = actions_for(&driver).fill("#nope", Some("x")).await.unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound { .. }));
}

#[tokio::test]
async fn toggle_switch_only_clicks_when_state_differs() {
    let driver = Arc::new(
        FakeDriver::new()
            .with_element("#off", FakeElement::visible().checked(false))
            .with_element("#on", FakeElement::visible().checked(true)),
    );
    let actions = actions_for(&driver);

    actions.toggle_switch("#off", SwitchState::On).await.unwrap();
    actions.toggle_switch("#on", SwitchState::On).await.unwrap();

    assert_eq!(driver.calls(), vec!["click:#off".to_string()]);
}

#[tokio::test]
async fn wait_for_element_timeout_carries_selector_and_budget() {
    let driver = Arc::new(FakeDriver::new());
    let err = actions_for(&driver)
        .wait_for_element("#late", Some(Duration::from_millis(250)))
        .await
        .unwrap_err();

    match err {
        E2eError::ElementWaitTimeout { selector, timeout_ms } => {
            assert_eq!(selector, "#late");
            assert_eq!(timeout_ms, 250);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn wait_for_element_default_timeout_is_ten_seconds() {
    let driver = Arc::new(FakeDriver::new());
    let err = actions_for(&driver).wait_for_element("#late", None).await.unwrap_err();
    assert!(matches!(err, E2eError::ElementWaitTimeout { timeout_ms: 10_000, .. }));
}

#[tokio::test]
async fn drag_by_offset_moves_from_center_to_corner_offset() {
    let driver = Arc::new(
        FakeDriver::new().with_element("#event", FakeElement::visible().with_box(10.0, 20.0, 100.0, 40.0)),
    );
    actions_for(&driver)
        .drag_and_drop_by_offset("#event", 50.0, 5.0)
        .await
        .unwrap();

    assert_eq!(
        driver.calls(),
        vec![
            "mouse_move:60,40".to_string(),
            "mouse_down".to_string(),
            "mouse_move:60,25".to_string(),
            "mouse_up".to_string(),
        ]
    );
}

#[tokio::test]
async fn drag_by_offset_missing_element_is_not_found() {
    let driver = Arc::new(FakeDriver::new());
    let err = actions_for(&driver)
        .drag_and_drop_by_offset("#ghost", 1.0, 1.0)
        .await
        .unwrap_err();
    match err {
        E2eError::ElementNotFound { selector } => assert_eq!(selector, "#ghost"),
        other => panic!("unexpected: {other}"),
    }
    assert_eq!(driver.calls_starting_with("mouse_"), 0);
}

#[tokio::test]
async fn drag_by_offset_element_without_box_is_not_found() {
    let driver = Arc::new(FakeDriver::new().with_element("#collapsed", FakeElement::hidden()));
    let err = actions_for(&driver)
        .drag_and_drop_by_offset("#collapsed", 1.0, 1.0)
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::ElementNotFound { .. }));
    assert_eq!(driver.calls_starting_with("mouse_"), 0);
}

#[tokio::test]
async fn upload_missing_local_file() {
    let driver = Arc::new(FakeDriver::new().with_element("#file", FakeElement::visible()));
    let err = actions_for(&driver)
        .upload_file("#file", std::path::Path::new("/definitely/not/here.pdf"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::FileNotFound(_)));
    assert_eq!(driver.calls_starting_with("set_input_files"), 0);
}

#[tokio::test]
async fn upload_forces_hidden_input_visible_and_tolerates_missing_name() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("invoice.pdf");
    std::fs::write(&file, b"%PDF-1.4").unwrap();

    let driver = Arc::new(FakeDriver::new().with_element("input[type=file]", FakeElement::hidden()));
    actions_for(&driver)
        .upload_file("input[type=file]", &file, None)
        .await
        .unwrap();

    let calls = driver.calls();
    let eval = calls.iter().position(|c| c == "eval:input[type=file]").unwrap();
    let set = calls
        .iter()
        .position(|c| c.starts_with("set_input_files:input[type=file]"))
        .unwrap();
    assert!(eval < set);
    assert!(driver.is_visible("input[type=file]").await.unwrap());
}

#[tokio::test]
async fn upload_waits_for_attach() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("doc.txt");
    std::fs::write(&file, b"x").unwrap();

    let driver = Arc::new(FakeDriver::new());
    let err = actions_for(&driver)
        .upload_file("#never", &file, None)
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::ElementWaitTimeout { timeout_ms: 5_000, .. }));
}

#[tokio::test(start_paused = true)]
async fn select_dropdown_option_uses_first_visible_selector() {
    let selectors = option_selectors("Euro");
    let driver = Arc::new(
        FakeDriver::new()
            .with_element(unfiltered(&selectors[0]), FakeElement::hidden())
            .with_element(unfiltered(&selectors[3]), FakeElement::visible()),
    );
    actions_for(&driver).select_dropdown_option("Euro").await.unwrap();
    assert_eq!(driver.calls(), vec![format!("click:{}", selectors[3])]);
}

#[tokio::test(start_paused = true)]
async fn select_dropdown_option_skips_hidden_leading_match() {
    // A stale popup left in the DOM renders a hidden copy ahead of the live one
    let selectors = option_selectors("Euro");
    let driver = Arc::new(FakeDriver::new().with_matches(
        unfiltered(&selectors[0]),
        vec![FakeElement::hidden(), FakeElement::visible()],
    ));
    actions_for(&driver).select_dropdown_option("Euro").await.unwrap();
    assert_eq!(driver.calls(), vec![format!("click:{}", selectors[0])]);
}

#[tokio::test(start_paused = true)]
async fn select_mui_autocomplete_finds_listbox_behind_hidden_one() {
    let listbox = listbox_selectors();
    let options = option_selectors("Hapoalim");
    let driver = Arc::new(
        FakeDriver::new()
            .with_element("#bank", FakeElement::visible())
            .with_matches(
                unfiltered(&listbox[0]),
                vec![FakeElement::hidden(), FakeElement::visible()],
            )
            .with_element(unfiltered(&options[0]), FakeElement::visible()),
    );
    actions_for(&driver)
        .select_mui_autocomplete("#bank", "Hapoalim")
        .await
        .unwrap();
    assert_eq!(driver.calls_starting_with("click:"), 2);
    assert_eq!(driver.calls().last(), Some(&format!("click:{}", options[0])));
}

#[tokio::test(start_paused = true)]
async fn select_dropdown_option_reports_missing_dropdown() {
    let driver = Arc::new(FakeDriver::new());
    let err = actions_for(&driver).select_dropdown_option("Yen").await.unwrap_err();
    match err {
        E2eError::DropdownNotFound { target } => assert_eq!(target, "Yen"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(start_paused = true)]
async fn select_mui_autocomplete_types_then_picks_option() {
    let selectors = option_selectors("Hapoalim");
    let driver = Arc::new(
        FakeDriver::new()
            .with_element("#bank", FakeElement::visible())
            .with_element(".MuiAutocomplete-listbox", FakeElement::visible())
            .with_element(unfiltered(&selectors[1]), FakeElement::visible()),
    );
    actions_for(&driver)
        .select_mui_autocomplete("#bank", "Hapoalim")
        .await
        .unwrap();

    assert_eq!(
        driver.calls(),
        vec![
            "click:#bank".to_string(),
            "fill:#bank=Hapoalim".to_string(),
            format!("click:{}", selectors[1]),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn select_mui_autocomplete_without_listbox() {
    let driver = Arc::new(FakeDriver::new().with_element("#bank", FakeElement::visible()));
    let err = actions_for(&driver)
        .select_mui_autocomplete("#bank", "Hapoalim")
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::DropdownNotFound { .. }));
}

#[tokio::test(start_paused = true)]
async fn validate_page_url_exact_match() {
    let driver = Arc::new(FakeDriver::new());
    driver.set_url("https://admin.cedar.test/app/dashboard");
    let actions = actions_for(&driver);

    actions
        .validate_page_url("https://admin.cedar.test/app/dashboard")
        .await
        .unwrap();
    let err = actions
        .validate_page_url("https://admin.cedar.test/login")
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed(_)));
}

#[tokio::test(start_paused = true)]
async fn validate_element_text_is_contains() {
    let driver = Arc::new(
        FakeDriver::new().with_element("h1", FakeElement::visible().with_text("Transactions (42)")),
    );
    let actions = actions_for(&driver);

    actions.validate_title("h1", "Transactions").await.unwrap();
    let err = actions.validate_element_text("h1", "Calendar").await.unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed(_)));
}

#[tokio::test]
async fn notification_dialog_must_show_title_and_message() {
    let driver = Arc::new(FakeDriver::new().with_element(
        "[role=\"dialog\"]",
        FakeElement::visible().with_text("Request sent Your transaction request was submitted"),
    ));
    let actions = actions_for(&driver);

    actions
        .verify_notification_dialog("Request sent", "was submitted")
        .await
        .unwrap();
    let err = actions
        .verify_notification_dialog("Request sent", "was rejected")
        .await
        .unwrap_err();
    assert!(matches!(err, E2eError::AssertionFailed(_)));
}

#[tokio::test]
async fn handle_dialog_registers_response() {
    let driver = Arc::new(FakeDriver::new());
    actions_for(&driver).handle_dialog(DialogAction::Dismiss).await.unwrap();
    assert_eq!(driver.dialog(), Some(DialogAction::Dismiss));
}

#[tokio::test]
async fn select_by_value_and_index() {
    let driver = Arc::new(FakeDriver::new().with_element("select#purpose", FakeElement::visible()));
    let actions = actions_for(&driver);

    actions.select_by_value("select#purpose", "invoice").await.unwrap();
    actions.select_by_index("select#purpose", 2).await.unwrap();

    assert_eq!(
        driver.calls(),
        vec![
            "select:select#purpose=Value(\"invoice\")".to_string(),
            "select:select#purpose=Index(2)".to_string(),
        ]
    );
}
