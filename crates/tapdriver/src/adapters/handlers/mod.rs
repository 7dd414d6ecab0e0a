//! Command handlers and the registration table that orders them.

pub mod actions;
pub mod alerts;
pub mod common;
pub mod context;
pub mod cookies;
pub mod elements;
pub mod extensions;
pub mod interaction;
pub mod navigation;
pub mod session;
pub mod touch;
pub mod unknown;

use super::command::{Handler, SessionScope};
use super::router::HttpMethod::{Delete, Get, Post};
use super::router::{CommandRouter, HttpMethod};

const UNKNOWN: Handler =
    Handler::new("unknownCommand", unknown::unknown_command).scope(SessionScope::None);

/// Commands some clients send that are answered with "unknown command".
const UNKNOWN_ROUTES: &[(HttpMethod, &str)] = &[
    (Get, "/session/:sessionId/ime/available_engines"),
    (Get, "/session/:sessionId/ime/active_engine"),
    (Get, "/session/:sessionId/ime/activated"),
    (Post, "/session/:sessionId/ime/deactivate"),
    (Post, "/session/:sessionId/ime/activate"),
    (Get, "/session/:sessionId/local_storage"),
    (Post, "/session/:sessionId/local_storage"),
    (Delete, "/session/:sessionId/local_storage"),
    (Get, "/session/:sessionId/local_storage/key/:key"),
    (Delete, "/session/:sessionId/local_storage/key/:key"),
    (Get, "/session/:sessionId/local_storage/size"),
    (Get, "/session/:sessionId/session_storage"),
    (Post, "/session/:sessionId/session_storage"),
    (Delete, "/session/:sessionId/session_storage"),
    (Get, "/session/:sessionId/session_storage/key/:key"),
    (Delete, "/session/:sessionId/session_storage/key/:key"),
    (Get, "/session/:sessionId/session_storage/size"),
    (Get, "/session/:sessionId/location"),
    (Post, "/session/:sessionId/location"),
    (Post, "/session/:sessionId/log"),
    (Get, "/session/:sessionId/log/types"),
    (Get, "/session/:sessionId/window/:windowHandle/position"),
    (Post, "/session/:sessionId/window/:windowHandle/position"),
    (Post, "/session/:sessionId/window/:windowHandle/maximize"),
    (Post, "/session/:sessionId/window/:windowHandle/size"),
    (Delete, "/session/:sessionId/window"),
    (Post, "/session/:sessionId/moveto"),
    (Post, "/session/:sessionId/buttondown"),
    (Post, "/session/:sessionId/buttonup"),
    (Post, "/session/:sessionId/doubleclick"),
    (Get, "/session/:sessionId/element/:id/css/:propertyName"),
    (Get, "/session/:sessionId/element/:id"),
];

/// The full command table in priority order.
pub fn build_router() -> CommandRouter<Handler> {
    let mut router = CommandRouter::new();
    router
        // Session lifecycle.
        .register(
            Get,
            "/status",
            Handler::new("status", session::status)
                .alert_safe()
                .scope(SessionScope::None),
        )
        .register(
            Post,
            "/session",
            Handler::new("newSession", session::new_session)
                .alert_safe()
                .scope(SessionScope::Create),
        )
        .register(
            Get,
            "/sessions",
            Handler::new("getSessions", session::list_sessions)
                .alert_safe()
                .scope(SessionScope::None),
        )
        .register(
            Get,
            "/session/:sessionId",
            Handler::new("getCapabilities", session::get_session).alert_safe(),
        )
        .register(
            Delete,
            "/session/:sessionId",
            Handler::new("deleteSession", session::delete_session)
                .alert_safe()
                .scope(SessionScope::Teardown),
        )
        .register(
            Post,
            "/session/:sessionId/timeouts/implicit_wait",
            Handler::new("implicitlyWait", session::set_implicit_wait),
        )
        .register(
            Post,
            "/session/:sessionId/timeouts",
            Handler::new("setTimeout", session::set_timeouts),
        )
        .register(
            Post,
            "/session/:sessionId/timeouts/async_script",
            Handler::new("setScriptTimeout", session::set_async_script_timeout),
        )
        .register(
            Post,
            "/session/:sessionId/configure",
            Handler::new("setCommandConfiguration", session::configure),
        )
        .register(
            Get,
            "/session/:sessionId/configure/:command",
            Handler::new("getCommandConfiguration", session::get_configuration),
        )
        // Alerts.
        .register(
            Get,
            "/session/:sessionId/alert_text",
            Handler::new("getAlertText", alerts::alert_text).alert_safe(),
        )
        .register(
            Post,
            "/session/:sessionId/alert_text",
            Handler::new("setAlertValue", alerts::set_alert_text).alert_safe(),
        )
        .register(
            Post,
            "/session/:sessionId/accept_alert",
            Handler::new("acceptAlert", alerts::accept_alert).alert_safe(),
        )
        .register(
            Post,
            "/session/:sessionId/dismiss_alert",
            Handler::new("dismissAlert", alerts::dismiss_alert).alert_safe(),
        )
        // Context and window.
        .register(
            Get,
            "/session/:sessionId/context",
            Handler::new("getCurrentContext", context::get_context).alert_safe(),
        )
        .register(
            Post,
            "/session/:sessionId/context",
            Handler::new("switchToContext", context::switch_context),
        )
        .register(
            Get,
            "/session/:sessionId/contexts",
            Handler::new("getContexts", context::list_contexts).alert_safe(),
        )
        .register(
            Get,
            "/session/:sessionId/window_handle",
            Handler::new("getCurrentWindowHandle", context::get_context).alert_safe(),
        )
        .register(
            Get,
            "/session/:sessionId/window_handles",
            Handler::new("getWindowHandles", context::list_contexts).alert_safe(),
        )
        .register(
            Post,
            "/session/:sessionId/window",
            Handler::new("switchToWindow", context::switch_context),
        )
        .register(
            Get,
            "/session/:sessionId/window/:windowHandle/size",
            Handler::new("getWindowSize", context::window_size),
        )
        .register(
            Post,
            "/session/:sessionId/frame",
            Handler::new("switchToFrame", context::switch_frame),
        )
        // Navigation.
        .register(
            Get,
            "/session/:sessionId/url",
            Handler::new("getCurrentUrl", navigation::current_url),
        )
        .register(
            Post,
            "/session/:sessionId/url",
            Handler::new("get", navigation::open_url),
        )
        .register(
            Post,
            "/session/:sessionId/back",
            Handler::new("goBack", navigation::back),
        )
        .register(
            Post,
            "/session/:sessionId/forward",
            Handler::new("goForward", navigation::forward),
        )
        .register(
            Post,
            "/session/:sessionId/refresh",
            Handler::new("refresh", navigation::refresh),
        )
        .register(
            Get,
            "/session/:sessionId/title",
            Handler::new("getTitle", navigation::title),
        )
        // Element lookup.
        .register(
            Post,
            "/session/:sessionId/element",
            Handler::new("findElement", elements::find_element),
        )
        .register(
            Post,
            "/session/:sessionId/elements",
            Handler::new("findElements", elements::find_elements),
        )
        .register(
            Post,
            "/session/:sessionId/element/active",
            Handler::new("getActiveElement", elements::active_element),
        )
        .register(
            Post,
            "/session/:sessionId/element/:id/element",
            Handler::new("findChildElement", elements::find_child),
        )
        .register(
            Post,
            "/session/:sessionId/element/:id/elements",
            Handler::new("findChildElements", elements::find_children),
        )
        // Element operations.
        .register(
            Get,
            "/session/:sessionId/element/:id/attribute/:name",
            Handler::new("getElementAttribute", elements::attribute),
        )
        .register(
            Post,
            "/session/:sessionId/element/:id/clear",
            Handler::new("clearElement", elements::clear),
        )
        .register(
            Post,
            "/session/:sessionId/element/:id/click",
            Handler::new("clickElement", elements::click),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/displayed",
            Handler::new("isElementDisplayed", elements::displayed),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/enabled",
            Handler::new("isElementEnabled", elements::enabled),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/location",
            Handler::new("getElementLocation", elements::location),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/location_in_view",
            Handler::new("getElementLocationOnceScrolledIntoView", elements::location_in_view),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/name",
            Handler::new("getElementTagName", elements::tag_name),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/selected",
            Handler::new("isElementSelected", elements::selected),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/size",
            Handler::new("getElementSize", elements::size),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/rect",
            Handler::new("getElementRect", elements::rect),
        )
        .register(
            Post,
            "/session/:sessionId/element/:id/submit",
            Handler::new("submitElement", elements::submit),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/text",
            Handler::new("getElementText", elements::text),
        )
        .register(
            Post,
            "/session/:sessionId/element/:id/value",
            Handler::new("sendKeysToElement", elements::send_keys),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/equals/:other",
            Handler::new("elementEquals", elements::equals),
        )
        .register(
            Get,
            "/session/:sessionId/element/:id/source",
            Handler::new("getElementSource", elements::element_source),
        )
        // Interaction and page.
        .register(
            Post,
            "/session/:sessionId/keys",
            Handler::new("sendKeysToActiveElement", interaction::keys),
        )
        .register(
            Post,
            "/session/:sessionId/execute",
            Handler::new("executeScript", interaction::execute),
        )
        .register(
            Post,
            "/session/:sessionId/execute_async",
            Handler::new("executeAsyncScript", interaction::execute_async),
        )
        .register(
            Get,
            "/session/:sessionId/screenshot",
            Handler::new("screenshot", interaction::screenshot).alert_safe(),
        )
        .register(
            Get,
            "/session/:sessionId/source",
            Handler::new("getPageSource", interaction::page_source),
        )
        .register(
            Get,
            "/session/:sessionId/orientation",
            Handler::new("getScreenOrientation", interaction::get_orientation),
        )
        .register(
            Post,
            "/session/:sessionId/orientation",
            Handler::new("setScreenOrientation", interaction::set_orientation),
        )
        .register(
            Get,
            "/-selendroid/:sessionId/screen/brightness",
            Handler::new("getBrightness", interaction::get_brightness),
        )
        .register(
            Post,
            "/-selendroid/:sessionId/screen/brightness",
            Handler::new("setBrightness", interaction::set_brightness),
        )
        .register(
            Get,
            "/session/:sessionId/cookie",
            Handler::new("getCookies", cookies::get_cookies),
        )
        .register(
            Post,
            "/session/:sessionId/cookie",
            Handler::new("addCookie", cookies::add_cookie),
        )
        .register(
            Delete,
            "/session/:sessionId/cookie",
            Handler::new("deleteAllCookies", cookies::delete_all_cookies),
        )
        .register(
            Delete,
            "/session/:sessionId/cookie/:name",
            Handler::new("deleteCookie", cookies::delete_cookie),
        )
        // Touch.
        .register(
            Post,
            "/session/:sessionId/touch/click",
            Handler::new("touchSingleTap", touch::single_tap),
        )
        .register(
            Post,
            "/session/:sessionId/tap/2",
            Handler::new("inspectorTap", touch::inspector_tap),
        )
        .register(
            Post,
            "/session/:sessionId/touch/doubleclick",
            Handler::new("touchDoubleTap", touch::double_tap),
        )
        .register(
            Post,
            "/session/:sessionId/touch/longclick",
            Handler::new("touchLongPress", touch::long_press),
        )
        .register(
            Post,
            "/session/:sessionId/touch/down",
            Handler::new("touchDown", touch::down),
        )
        .register(
            Post,
            "/session/:sessionId/touch/up",
            Handler::new("touchUp", touch::up),
        )
        .register(
            Post,
            "/session/:sessionId/touch/move",
            Handler::new("touchMove", touch::move_to),
        )
        .register(
            Post,
            "/session/:sessionId/touch/scroll",
            Handler::new("touchScroll", touch::scroll),
        )
        .register(
            Post,
            "/session/:sessionId/touch/flick",
            Handler::new("touchFlick", touch::flick),
        )
        // Action chains.
        .register(
            Post,
            "/session/:sessionId/actions",
            Handler::new("actions", actions::perform_actions),
        )
        // Extensions.
        .register(
            Post,
            "/session/:sessionId/extension",
            Handler::new("loadExtension", extensions::load_extension),
        )
        .register(
            Post,
            "/session/:sessionId/extension/:name",
            Handler::new("executeExtension", extensions::execute_extension),
        );

    for (method, template) in UNKNOWN_ROUTES {
        router.register(*method, template, UNKNOWN);
    }
    router.fallback("/session/:sessionId", UNKNOWN);
    router
}
