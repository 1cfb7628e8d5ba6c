//! UI Components

use leptos::prelude::*;

use crate::api;

/// Label shown while the payment is being created
pub const BUSY_LABEL: &str = "Redirecting...";

/// Shown for every failure, whatever the cause
pub const FAILURE_ALERT: &str =
    "Sorry, something went wrong starting your donation. Please try again.";

/// What the page should do once the server has answered
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Navigate(String),
    Alert(&'static str),
}

/// Donate button state, kept apart from the DOM so the transitions are testable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonState {
    pub label: String,
    pub busy: bool,
    original: String,
}

impl ButtonState {
    pub fn idle(label: impl Into<String>) -> Self {
        let label = label.into();
        Self {
            original: label.clone(),
            label,
            busy: false,
        }
    }

    /// Enter the busy state. Returns false if a request is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.busy {
            return false;
        }
        self.busy = true;
        self.label = BUSY_LABEL.into();
        true
    }

    /// Apply the server's answer
    pub fn settle(&mut self, result: Result<String, String>) -> Effect {
        match result {
            // The page is about to go away, so the busy state stays
            Ok(url) => Effect::Navigate(url),
            Err(_) => {
                self.label = self.original.clone();
                self.busy = false;
                Effect::Alert(FAILURE_ALERT)
            }
        }
    }
}

fn apply(effect: Effect) {
    let Some(window) = web_sys::window() else {
        return;
    };
    match effect {
        Effect::Navigate(url) => {
            let _ = window.location().set_href(&url);
        }
        Effect::Alert(message) => {
            let _ = window.alert_with_message(message);
        }
    }
}

/// Button that starts a hosted payment and sends the donor to it
#[component]
pub fn DonateButton(
    #[prop(into, default = "Donate".into())] label: String,
    #[prop(optional)] amount_minor: Option<u64>,
) -> impl IntoView {
    let state = RwSignal::new(ButtonState::idle(label));

    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        if !state.try_update(ButtonState::begin).unwrap_or(false) {
            return;
        }

        leptos::task::spawn_local(async move {
            let result = api::create_payment(amount_minor).await;
            if let Some(effect) = state.try_update(|s| s.settle(result)) {
                apply(effect);
            }
        });
    };

    view! {
        <button
            class="btn btn-primary donateBtn"
            on:click=on_click
            disabled=move || state.with(|s| s.busy)
            aria-busy=move || state.with(|s| s.busy.then_some("true"))
        >
            {move || state.with(|s| s.label.clone())}
        </button>
    }
}
