/// Runtime tests for tree operations, events, styles and literal commits
use crate::*;

#[cfg(test)]
mod runtime_tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct HelloCard;

    impl Component for HelloCard {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|scope| {
                let name = scope.prop("name").map(|v| v.to_string()).unwrap_or_default();
                Ok(crate::html!(scope; "<p>Hello " {name} "</p>").into())
            }))
        }
    }

    fn badge_css() -> String {
        ".b { color: red }".to_string()
    }

    #[derive(Default)]
    struct ShadowBadge;

    impl Component for ShadowBadge {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|_| Ok(TemplateResult::unsafe_raw("<span>b</span>").into())))
        }

        fn shadow(&self) -> bool {
            true
        }

        fn stylesheet(&self) -> Option<fn() -> String> {
            Some(badge_css)
        }
    }

    #[derive(Default)]
    struct TitleBlock;

    impl Component for TitleBlock {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|scope| {
                Ok(crate::html!(scope; "<h1 styles=\"title\">x</h1><p>plain</p>").into())
            }))
        }

        fn styles(&self, _scope: &Scope) -> StyleGroups {
            let mut title = indexmap::IndexMap::new();
            title.insert("fontSize".to_string(), "12px".to_string());
            title.insert("color".to_string(), "navy".to_string());

            let mut groups = StyleGroups::new();
            groups.insert("title".to_string(), title);
            groups
        }
    }

    #[derive(Default)]
    struct EmptyShell;

    impl Component for EmptyShell {}

    #[test]
    fn test_markup_mounts_registered_elements() {
        let rt = Runtime::new();
        rt.register::<HelloCard>().unwrap();

        let body = rt.body();
        rt.set_inner_html(body, r#"<hello-card name="Ada"></hello-card>"#)
            .unwrap();

        let host = rt.query_selector(body, "hello-card").unwrap().unwrap();
        assert!(rt.is_component(host));
        assert_eq!(rt.inner_html(host), "<p>Hello Ada</p>");
    }

    #[test]
    fn test_detached_element_is_constructed_but_not_rendered() {
        let rt = Runtime::new();
        rt.register::<HelloCard>().unwrap();

        let host = rt.create_element("hello-card").unwrap();
        assert!(rt.is_component(host));
        assert!(!rt.scope(host).unwrap().is_connected());
        assert_eq!(rt.inner_html(host), "");

        rt.append_child(rt.body(), host).unwrap();
        assert!(rt.scope(host).unwrap().is_connected());
        assert_eq!(rt.inner_html(host), "<p>Hello </p>");
    }

    #[test]
    fn test_scope_of_plain_element_is_an_error() {
        let rt = Runtime::new();
        let div = rt.create_element("div").unwrap();
        assert!(matches!(rt.scope(div), Err(RuntimeError::NotAComponent(n)) if n == div));
    }

    #[test]
    fn test_dispatch_bubbles_until_stopped() {
        let rt = Runtime::new();
        let body = rt.body();
        rt.set_inner_html(body, "<div><button>go</button></div>").unwrap();
        let div = rt.query_selector(body, "div").unwrap().unwrap();
        let button = rt.query_selector(body, "button").unwrap().unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        rt.add_event_listener(div, "select", move |event| {
            log.borrow_mut().push(("div", event.target(), event.current_target()));
        });
        let log = seen.clone();
        let stopper = rt.add_event_listener(button, "select", move |event| {
            log.borrow_mut().push(("button", event.target(), event.current_target()));
            event.stop_propagation();
        });

        assert!(rt.dispatch_event(button, Event::custom("select", Value::Null)));
        assert_eq!(*seen.borrow(), vec![("button", Some(button), Some(button))]);

        seen.borrow_mut().clear();
        assert!(rt.remove_event_listener(stopper));
        rt.dispatch_event(button, Event::custom("select", Value::Null));
        assert_eq!(*seen.borrow(), vec![("div", Some(button), Some(div))]);
    }

    #[test]
    fn test_non_bubbling_event_stays_on_target() {
        let rt = Runtime::new();
        let body = rt.body();
        let count = Rc::new(RefCell::new(0));
        let counter = count.clone();
        rt.add_event_listener(body, "focus", move |_| *counter.borrow_mut() += 1);

        let input = rt.create_element("input").unwrap();
        rt.append_child(body, input).unwrap();
        rt.dispatch_event(input, Event::new("focus"));
        assert_eq!(*count.borrow(), 0);
    }

    #[test]
    fn test_prevent_default_is_reported() {
        let rt = Runtime::new();
        let body = rt.body();
        rt.add_event_listener(body, "submit", |event| event.prevent_default());
        assert!(!rt.dispatch_event(body, Event::custom("submit", Value::Null)));
    }

    #[test]
    fn test_composed_events_cross_shadow_boundary() {
        let rt = Runtime::new();
        rt.register::<ShadowBadge>().unwrap();
        let body = rt.body();
        rt.set_inner_html(body, "<shadow-badge></shadow-badge>").unwrap();

        let host = rt.query_selector(body, "shadow-badge").unwrap().unwrap();
        let shadow = rt.document().shadow_root(host).unwrap();
        let span = rt.query_selector(shadow, "span").unwrap().unwrap();

        let hits = Rc::new(RefCell::new(0));
        let counter = hits.clone();
        rt.add_event_listener(host, "ping", move |_| *counter.borrow_mut() += 1);

        rt.dispatch_event(span, Event::custom("ping", Value::Null));
        assert_eq!(*hits.borrow(), 0);

        rt.dispatch_event(span, Event::custom("ping", Value::Null).with_composed(true));
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn test_shadow_stylesheet_is_inlined_with_nonce() {
        let rt = Runtime::with_config(RuntimeConfig::default().with_nonce("abc")).unwrap();
        rt.register::<ShadowBadge>().unwrap();
        let body = rt.body();
        rt.set_inner_html(body, "<shadow-badge></shadow-badge>").unwrap();

        let host = rt.query_selector(body, "shadow-badge").unwrap().unwrap();
        let shadow = rt.document().shadow_root(host).unwrap();
        assert_eq!(
            rt.inner_html(shadow),
            "<style nonce=\"abc\">.b { color: red }</style><span>b</span>"
        );
        assert_eq!(rt.inner_html(host), "");
        assert_eq!(rt.inner_html(rt.head()), "");
    }

    #[test]
    fn test_style_groups_are_inlined() {
        let rt = Runtime::new();
        rt.register::<TitleBlock>().unwrap();
        let body = rt.body();
        rt.set_inner_html(body, "<title-block></title-block>").unwrap();

        let h1 = rt.query_selector(body, "h1").unwrap().unwrap();
        let p = rt.query_selector(body, "p").unwrap().unwrap();
        assert_eq!(
            rt.get_attribute(h1, "style").as_deref(),
            Some("font-size: 12px; color: navy;")
        );
        assert_eq!(rt.document().style_property(h1, "fontSize").as_deref(), Some("12px"));
        assert_eq!(rt.get_attribute(p, "style"), None);
    }

    #[test]
    fn test_literal_content() {
        let rt = Runtime::new();
        rt.register::<EmptyShell>().unwrap();
        let body = rt.body();
        rt.set_inner_html(body, "<empty-shell>original</empty-shell>").unwrap();
        let host = rt.query_selector(body, "empty-shell").unwrap().unwrap();
        assert_eq!(rt.inner_html(host), "original");

        rt.render_literal(host, "<b>").unwrap();
        assert_eq!(rt.inner_html(host), "&lt;b&gt;");

        let source = rt.create_element("em").unwrap();
        let text = rt.create_text("copied");
        rt.append_child(source, text).unwrap();
        rt.render_literal(host, source).unwrap();
        assert_eq!(rt.inner_html(host), "<em>copied</em>");
        let copy = rt.query_selector(host, "em").unwrap().unwrap();
        assert_ne!(copy, source);

        rt.render_literal(host, Content::Empty).unwrap();
        assert_eq!(rt.inner_html(host), "");
    }

    #[test]
    fn test_selector_errors_surface_as_dom_errors() {
        let rt = Runtime::new();
        let result = rt.query_selector(rt.body(), "div p");
        assert!(matches!(result, Err(RuntimeError::Dom(_))));
    }

    #[test]
    fn test_closest_for_delegation() {
        let rt = Runtime::new();
        let body = rt.body();
        rt.set_inner_html(body, r#"<ul><li data-id="7"><span>seven</span></li></ul>"#)
            .unwrap();
        let span = rt.query_selector(body, "span").unwrap().unwrap();

        let item = rt.closest(span, "[data-id]").unwrap().unwrap();
        assert_eq!(rt.get_attribute(item, "data-id").as_deref(), Some("7"));
        assert_eq!(rt.closest(span, "table").unwrap(), None);
    }

    #[derive(Default)]
    struct ShadowList;

    impl Component for ShadowList {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|_| {
                Ok(TemplateResult::unsafe_raw("<late-item></late-item>").into())
            }))
        }

        fn shadow(&self) -> bool {
            true
        }
    }

    #[derive(Default)]
    struct LateItem;

    impl Component for LateItem {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|_| Ok(Content::from("late"))))
        }
    }

    #[test]
    fn test_register_upgrades_elements_inside_shadow_roots() {
        let rt = Runtime::new();
        rt.register::<ShadowList>().unwrap();
        let body = rt.body();
        rt.set_inner_html(body, "<shadow-list></shadow-list>").unwrap();

        let host = rt.query_selector(body, "shadow-list").unwrap().unwrap();
        let shadow = rt.document().shadow_root(host).unwrap();
        let item = rt.query_selector(shadow, "late-item").unwrap().unwrap();
        assert!(!rt.is_component(item));

        rt.register::<LateItem>().unwrap();
        assert!(rt.is_component(item));
        assert_eq!(rt.inner_html(item), "late");
    }

    #[derive(Default)]
    struct PassThrough;

    impl Component for PassThrough {
        fn render(&self) -> Option<RenderFn> {
            Some(RenderFn::sync(|scope| {
                let attributes = scope.attributes();
                Ok(crate::html!(scope; "<a ..." {attributes} ">x</a>").into())
            }))
        }
    }

    #[test]
    fn test_host_attributes_spread_onto_inner_element() {
        let rt = Runtime::new();
        rt.register::<PassThrough>().unwrap();
        let body = rt.body();
        rt.set_inner_html(body, r#"<pass-through title="Hi" aria-label="Go"></pass-through>"#)
            .unwrap();

        let host = rt.query_selector(body, "pass-through").unwrap().unwrap();
        assert_eq!(rt.inner_html(host), r#"<a title="Hi" aria-label="Go">x</a>"#);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = RuntimeConfig {
            id_prefix: "app_1".into(),
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            Runtime::with_config(config),
            Err(ConfigError::InvalidPrefix(prefix)) if prefix == "app_1"
        ));
    }
}
