//! The XML and JSON payloads of one notice carry the same information.

use nt_core::{build, Configuration, Notice, NoticeFields, StaticRequestContext};
use nt_core::{render, PayloadFormat};
use proptest::prelude::*;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Default)]
struct Node {
    name: String,
    attrs: BTreeMap<String, String>,
    children: Vec<Node>,
    text: String,
    self_closing: bool,
}

impl Node {
    fn from_start(start: &BytesStart<'_>) -> Self {
        let name = String::from_utf8(start.name().as_ref().to_vec()).unwrap();
        let attrs = start
            .attributes()
            .map(|attr| {
                let attr = attr.unwrap();
                let key = String::from_utf8(attr.key.as_ref().to_vec()).unwrap();
                let value = attr.unescape_value().unwrap().to_string();
                (key, value)
            })
            .collect();
        Node {
            name,
            attrs,
            ..Node::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// A `<var>` subtree as a normalized value.
    fn var_value(&self) -> Value {
        if self.self_closing {
            Value::Null
        } else if !self.children.is_empty() {
            Value::Object(vars_to_map(&self.children))
        } else {
            Value::String(self.text.clone())
        }
    }
}

fn vars_to_map(vars: &[Node]) -> Map<String, Value> {
    vars.iter()
        .map(|var| (var.attrs["key"].clone(), var.var_value()))
        .collect()
}

fn parse_xml(xml: &str) -> Node {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::default()];

    loop {
        match reader.read_event().unwrap() {
            Event::Start(start) => stack.push(Node::from_start(&start)),
            Event::Empty(start) => {
                let mut node = Node::from_start(&start);
                node.self_closing = true;
                stack.last_mut().unwrap().children.push(node);
            }
            Event::Text(text) => {
                let text = text.unescape().unwrap();
                stack.last_mut().unwrap().text.push_str(&text);
            }
            Event::End(_) => {
                let node = stack.pop().unwrap();
                stack.last_mut().unwrap().children.push(node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let mut document = stack.pop().unwrap();
    assert!(stack.is_empty(), "unbalanced document");
    document.children.remove(0)
}

/// JSON bag in the shape the XML var tree can express.
fn normalize(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::String(s) => Value::String(s.clone()),
        Value::Bool(b) => Value::String(b.to_string()),
        Value::Number(n) => Value::String(n.to_string()),
        Value::Array(items) if items.is_empty() => Value::String(String::new()),
        Value::Object(map) if map.is_empty() => Value::String(String::new()),
        Value::Array(items) => Value::Object(
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| (idx.to_string(), normalize(item)))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), normalize(item)))
                .collect(),
        ),
    }
}

fn xml_bag(request: Option<&Node>, name: &str) -> Value {
    let vars = request
        .and_then(|r| r.child(name))
        .map(|bag| vars_to_map(&bag.children))
        .unwrap_or_default();
    Value::Object(vars)
}

fn json_bag(value: &Value) -> Value {
    match normalize(value) {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    }
}

fn assert_equivalent(notice: &Notice) {
    let xml = render(notice, PayloadFormat::Xml).unwrap().body;
    let doc: Value = serde_json::from_str(&render(notice, PayloadFormat::Json).unwrap().body).unwrap();
    let root = parse_xml(&xml);
    assert_eq!(root.name, "notice");

    assert_eq!(root.child_text("api-key"), doc["apiKey"].as_str());

    let notifier = root.child("notifier").unwrap();
    assert_eq!(notifier.child_text("name"), doc["notifier"]["name"].as_str());
    assert_eq!(notifier.child_text("version"), doc["notifier"]["version"].as_str());

    let error = root.child("error").unwrap();
    assert_eq!(error.child_text("class"), doc["error"]["class"].as_str());
    assert_eq!(error.child_text("message"), doc["error"]["message"].as_str());

    let lines = &error.child("backtrace").unwrap().children;
    let frames = doc["backtrace"].as_array().unwrap();
    assert_eq!(lines.len(), frames.len());
    for (line, frame) in lines.iter().zip(frames) {
        assert_eq!(line.attrs.get("file").map(String::as_str), frame["file"].as_str());
        assert_eq!(line.attrs.get("method").map(String::as_str), frame["method"].as_str());
        assert_eq!(
            line.attrs.get("number").cloned(),
            frame["line"].as_u64().map(|n| n.to_string())
        );
    }

    let request = root.child("request");
    assert_eq!(request.and_then(|r| r.child_text("url")), doc["request"]["url"].as_str());
    assert_eq!(
        request.and_then(|r| r.child_text("component")),
        doc["request"]["component"].as_str()
    );
    assert_eq!(xml_bag(request, "params"), json_bag(&doc["request"]["params"]));
    assert_eq!(xml_bag(request, "session"), json_bag(&doc["request"]["sessionData"]));
    assert_eq!(xml_bag(request, "cgi-data"), json_bag(&doc["request"]["cgiData"]));

    let env = root.child("server-environment").unwrap();
    assert_eq!(
        env.child_text("environment-name"),
        doc["serverEnvironment"]["environmentName"].as_str()
    );
    assert_eq!(
        env.child_text("hostname"),
        doc["serverEnvironment"]["hostname"].as_str()
    );
}

#[test]
fn test_full_notice_equivalence() {
    let config = Configuration::default()
        .with_api_key("abc123")
        .with_params_filter("password");
    let ctx = StaticRequestContext {
        url: Some("https://shop.example.com/orders?page=2".to_string()),
        session: Some(json!({"data": {"cart": [1, 2, {"sku": "X-1"}]}})),
        metadata: Some(
            json!({"HTTP_HOST": "shop.example.com", "SERVER_PORT": 443})
                .as_object()
                .cloned()
                .unwrap(),
        ),
        ..StaticRequestContext::default()
    };
    let fields = NoticeFields {
        error_class: Some("OrderError".to_string()),
        error_message: Some("total < 0 & rising".to_string()),
        backtrace: Some(vec![
            "app/models/order.rb:44:in 'total'".into(),
            "<internal:kernel>".into(),
        ]),
        parameters: Some(json!({
            "controller": "orders",
            "password": "hunter2",
            "flags": [true, false],
            "empty": {},
            "missing": null
        })),
        ..NoticeFields::default()
    };

    let notice = build(&config, &fields, None, Some(&ctx)).unwrap();
    assert_equivalent(&notice);
}

#[test]
fn test_minimal_notice_equivalence() {
    let notice = build(&Configuration::default(), &NoticeFields::default(), None, None).unwrap();
    assert_equivalent(&notice);
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z0-9 <>&\"'.-]{0,12}".prop_map(Value::String),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z_]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_params_render_equivalently(
        params in prop::collection::btree_map("[a-z_]{1,6}", tree(), 0..5)
    ) {
        let fields = NoticeFields {
            parameters: Some(Value::Object(params.into_iter().collect())),
            ..NoticeFields::default()
        };
        let notice = build(&Configuration::default(), &fields, None, None).unwrap();
        assert_equivalent(&notice);
    }
}
