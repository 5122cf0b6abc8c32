//! Selector tables for the applications under test
//!
//! Each page is a module of selector constants plus a `FIELDS` table so
//! scenario files can refer to a selector as `@page.field`. Tables hold no
//! driver handle; pass the selectors to [`crate::actions::UiActions`].

use crate::error::{E2eError, E2eResult};

macro_rules! selector_table {
    (
        $(#[$meta:meta])*
        $page:ident {
            $( $(#[$fmeta:meta])* $name:ident = $field:literal => $selector:expr; )*
        }
    ) => {
        $(#[$meta])*
        pub mod $page {
            $( $(#[$fmeta])* pub const $name: &str = $selector; )*

            /// `(field, selector)` pairs in declaration order
            pub const FIELDS: &[(&str, &str)] = &[ $( ($field, $name), )* ];
        }
    };
}

selector_table! {
    /// Scheduler/calendar demo app
    calendar {
        INFINITE_SCROLL_BUTTON = "infinite_scroll_button" => "text=Infinite scroll";
        MONTH_VIEW_BUTTON = "month_view_button" => r#"//span/span[text()="Month"]"#;
        MONTH_VIEW_SELECTED = "month_view_selected" => r#"input.ant-radio-button-input[value="200"]"#;
        DAY_VIEW_BUTTON = "day_view_button" => r#"//span/span[text()="Day"]"#;
        DAY_VIEW_SELECTED = "day_view_selected" => r#"input.ant-radio-button-input[value="000"]"#;
        SCHEDULER_VIEW_HEADER = "scheduler_view_header" => ".scheduler-view-header";
        RESOURCE_R1_ADD_EVENT = "resource_r1_add_event" => "div.event-container > a.timeline-event";
        TITLE_INPUT = "title_input" => r#"input[name="title"]"#;
        NEXT_MONTH_BUTTON = "next_month_button" => r#"svg[data-icon="right"]"#;
        PREVIOUS_MONTH_BUTTON = "previous_month_button" => r#"svg[data-icon="left"]"#;
        SLOT_0 = "slot_0" => "tr:nth-child(4) > td > .event-container";
        SLOT_1 = "slot_1" => "tr:nth-child(5) > td > .event-container";
        SLOT_2 = "slot_2" => "tr:nth-child(6) > td > .event-container";
        SLOT_3 = "slot_3" => "tr:nth-child(7) > td > .event-container";
        SLOT_4 = "slot_4" => "tr:nth-child(8) > td > .event-container";
        NEW_EVENT = "new_event" => r#"//span[text()="New event you just created"]"#;
        RECURRING_TASK_EVENT = "recurring_task_event" => "a:nth-child(9)";
        FIRST_EVENT_CONTAINER = "first_event_container" => r#"(//div[contains(@class, "event-container")])[1]"#;
        SECOND_EVENT_CONTAINER = "second_event_container" => r#"(//div[contains(@class, "event-container")])[2]"#;
        DATE_HEADER = "date_header" => ".header2-text-label";
    }
}

selector_table! {
    /// Admin CRM login
    admin_login {
        EMAIL_INPUT = "email_input" => r#"input[name="email"][type="email"]"#;
        PASSWORD_INPUT = "password_input" => r#"input[name="password"][type="password"]"#;
        LOGIN_BUTTON = "login_button" => r#"[data-cy="loginButton"]"#;
        TRANSACTIONS_LINK = "transactions_link" => r#"a[href="/app/crud/OnRampOffRampRequest/table"]"#;
        SEND_TRANSACTION_LINK = "send_transaction_link" => r#"a[data-cy="OnRampOffRampRequestNav"]"#;
    }
}

selector_table! {
    /// Admin transactions table: status tabs, column cells, column filters
    /// and pagination
    transactions {
        TABLE_HEADER = "table_header" => "thead.MuiTableHead-root";
        IN_PROGRESS_TAB = "in_progress_tab" => r#"//button[@role="tab" and @aria-selected="false" and .//span[contains(@class, "MuiBadge-root") and text()="In Progress"]]"#;
        IN_PROGRESS_DEPOSIT_CONFIRMED_TAB = "in_progress_deposit_confirmed_tab" => r#"//button[@role="tab" and @aria-selected="false" and .//span[contains(@class, "MuiBadge-root") and text()="In Progress - Deposit Confirmed"]]"#;
        COMPLETED_TELEX_REQUESTED_TAB = "completed_telex_requested_tab" => r#"//button[@role="tab" and @aria-selected="false" and .//span[contains(@class, "MuiBadge-root") and text()="Completed - Telex Requested"]]"#;
        COMPLETED_TAB = "completed_tab" => r#"//button[@role="tab" and @aria-selected="false" and .//span[contains(@class, "MuiBadge-root") and text()="Completed"]]"#;
        CANCELLED_TAB = "cancelled_tab" => r#"//button[@role="tab" and .//span[contains(@class, "MuiBadge-root") and text()="Cancelled"]]"#;
        ALL_TAB = "all_tab" => r#"//button[@role="tab" and .//span[text()="All"]]"#;
        CEDAR_ID = "cedar_id" => "tr.MuiTableRow-root > td:nth-child(2) .MuiTypography-root";
        CEDAR_ID_SEARCH = "cedar_id_search" => r#"[id="\:r1r\:"]"#;
        CREATION_TIME = "creation_time" => "tr.MuiTableRow-root > td:nth-child(3) .MuiTypography-root";
        CREATION_TIME_SEARCH = "creation_time_search" => r#"[id="\:r1s\:"]"#;
        FROM_MERCHANT = "from_merchant" => "tr.MuiTableRow-root > td:nth-child(4) .MuiTypography-root";
        FROM_MERCHANT_SEARCH = "from_merchant_search" => r#"[id="\:r1t\:"]"#;
        TO_MERCHANT = "to_merchant" => "tr.MuiTableRow-root > td:nth-child(5) .MuiTypography-root";
        TO_MERCHANT_SEARCH = "to_merchant_search" => r#"[id="\:r1v\:"]"#;
        TO_RECEIVER_ACCOUNT = "to_receiver_account" => "tr.MuiTableRow-root > td:nth-child(6) .MuiTypography-root";
        TO_RECEIVER_ACCOUNT_SEARCH = "to_receiver_account_search" => r#"[id="\:r21\:"]"#;
        FROM_CURRENCY = "from_currency" => "tr.MuiTableRow-root > td:nth-child(7) .MuiTypography-root";
        FROM_CURRENCY_SEARCH = "from_currency_search" => r#"[id="\:r23\:"]"#;
        FROM_AMOUNT = "from_amount" => "tr.MuiTableRow-root > td:nth-child(8) .MuiTypography-root";
        FROM_AMOUNT_SEARCH = "from_amount_search" => r#"[id="\:r25\:"]"#;
        TO_CURRENCY = "to_currency" => "tr.MuiTableRow-root > td:nth-child(9) .MuiTypography-root";
        TO_CURRENCY_SEARCH = "to_currency_search" => r#"[id="\:r26\:"]"#;
        TO_AMOUNT = "to_amount" => "tr.MuiTableRow-root > td:nth-child(10) .MuiTypography-root";
        TO_AMOUNT_SEARCH = "to_amount_search" => r#"[id="\:r28\:"]"#;
        CLIENT_STATUS = "client_status" => "tr.MuiTableRow-root > td:nth-child(11) .MuiTypography-root";
        CLIENT_STATUS_SEARCH = "client_status_search" => r#"[id="\:r29\:"]"#;
        GO_TO_PAGE_2 = "go_to_page_2" => r#"button[aria-label="Go to page 2"]"#;
        GO_TO_PAGE_3 = "go_to_page_3" => r#"button[aria-label="Go to page 3"]"#;
        GO_TO_FIRST_PAGE = "go_to_first_page" => r#"button[aria-label="Go to first page"]"#;
        GO_TO_NEXT_PAGE = "go_to_next_page" => r#"svg[data-testid="NavigateNextIcon"]"#;
        GO_TO_PREVIOUS_PAGE = "go_to_previous_page" => r#"button[aria-label="Go to previous page"]"#;
        GO_TO_LAST_PAGE = "go_to_last_page" => r#"svg[data-testid="LastPageIcon"]"#;
        PAGE_2_CURRENT = "page_2_current" => r#"button[aria-label="page 2"][aria-current="true"]"#;
        PAGE_3_CURRENT = "page_3_current" => r#"button[aria-label="page 3"][aria-current="true"]"#;
        CLEAR_FILTER = "clear_filter" => r#"svg[data-testid="CloseOutlinedIcon"]"#;
    }
}

selector_table! {
    /// Admin send-transaction entry point
    send_transaction {
        NAV = "nav" => r#"[data-cy="OnRampOffRampRequestNav"]"#;
        WORKFLOW_BUTTON = "workflow_button" => r#"button:has(svg[data-testid="SchemaTwoToneIcon"])"#;
    }
}

selector_table! {
    /// Client app sign-in (hosted auth widget)
    client_login {
        SIGNUP_LINK = "signup_link" => r#"a[data-localization-key="signIn.start.actionLink"]"#;
        GOOGLE_LOGIN = "google_login" => "button.cl-socialButtonsBlockButton__google";
        EMAIL_INPUT = "email_input" => r#"input[id="identifier-field"]"#;
        GOOGLE_EMAIL_OR_PHONE = "google_email_or_phone" => "#identifierId";
        CONTINUE_BUTTON = "continue_button" => r#"button[data-localization-key="formButtonPrimary"]"#;
        PASSWORD_INPUT = "password_input" => r#"input[id="password-field"]"#;
    }
}

selector_table! {
    client_signup {
        EMAIL_INPUT = "email_input" => r#"//input[@id='emailAddress-field' and @type='email']"#;
        PASSWORD_INPUT = "password_input" => r#"//input[@id='password-field' and @type='password']"#;
        CONTINUE_BUTTON = "continue_button" => r#"button.cl-formButtonPrimary[data-localization-key="formButtonPrimary"]"#;
    }
}

selector_table! {
    /// Client app send-money form
    client_send {
        SEND_NAV = "send_nav" => r#"a[data-cy="sendNav"]"#;
        CLEAR_CURRENCY_TO_SEND = "clear_currency_to_send" => "(//button[@aria-label='Clear' and @title='Clear'])[1]";
        CLEAR_CURRENCY_YOU_PAY = "clear_currency_you_pay" => "(//button[@aria-label='Clear' and @title='Clear'])[2]";
        AMOUNT = "amount" => "input.MuiInputBase-input.MuiOutlinedInput-input";
        CURRENCY_TO_SEND = "currency_to_send" => r#"div[data-cy="toCurrencyId"] input[type="text"]"#;
        YOU_ARE_PAYING = "you_are_paying" => r#"div[data-cy="fromCurrencyId"] input[type="text"]"#;
        INVOICE_INPUT = "invoice_input" => r#"input[type="file"]"#;
        SEND_TO = "send_to" => r#"div[data-cy="toBusinessContactId"] input[type="text"]"#;
        BANK_ACCOUNT_OPEN = "bank_account_open" => r#"div[data-cy="toBusinessExternalAccountId"] button[aria-label="Open"]"#;
        BANK_ACCOUNT_POPUP_INDICATOR = "bank_account_popup_indicator" => r#"[data-cy="toBusinessExternalAccountId"] .MuiAutocomplete-popupIndicator"#;
        BANK_ACCOUNT_INPUT = "bank_account_input" => r#"div[data-cy="toBusinessExternalAccountId"] input[type="text"]"#;
        PURPOSE = "purpose" => r#"div[data-cy="purpose"] input[placeholder="Select"]"#;
        CONFIRM_REQUEST = "confirm_request" => r#"button[data-cy="confirmRequestButton"]"#;
    }
}

/// Selector for a calendar event whose title contains `name`
pub fn calendar_event(name: &str) -> String {
    format!("//span[contains(text(), '{}')]", name)
}

/// Every page table by name
pub const PAGES: &[(&str, &[(&str, &str)])] = &[
    ("calendar", calendar::FIELDS),
    ("admin_login", admin_login::FIELDS),
    ("transactions", transactions::FIELDS),
    ("send_transaction", send_transaction::FIELDS),
    ("client_login", client_login::FIELDS),
    ("client_signup", client_signup::FIELDS),
    ("client_send", client_send::FIELDS),
];

/// Look up `page.field` (an optional leading `@` is ignored)
pub fn resolve(reference: &str) -> E2eResult<&'static str> {
    let unknown = || E2eError::UnknownSelector(reference.to_string());
    let trimmed = reference.strip_prefix('@').unwrap_or(reference);
    let (page, field) = trimmed.split_once('.').ok_or_else(unknown)?;

    let fields = PAGES
        .iter()
        .find(|(name, _)| *name == page)
        .map(|(_, fields)| *fields)
        .ok_or_else(unknown)?;

    fields
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, selector)| *selector)
        .ok_or_else(unknown)
}

/// Resolve `@page.field` references and pass plain selectors through
pub fn resolve_selector(selector: &str) -> E2eResult<String> {
    if selector.starts_with('@') {
        resolve(selector).map(str::to_string)
    } else {
        Ok(selector.to_string())
    }
}
