#![allow(dead_code)]

use apicize_transcode::{
    ExecutionConcurrency, NameValuePair, Request, RequestBody, RequestEntry, RequestGroup,
    RequestMethod, Scenario, Selection, Variable, VariableSourceType, Workbook,
};
use serde_json::json;

pub const STATUS_TEST: &str = "describe('status', () => {\n    it('equals 200', () => {\n        expect(response.status).to.equal(200)\n    })\n})";

pub fn request(id: &str, name: &str, test: Option<&str>) -> Request {
    Request {
        id: id.to_string(),
        name: name.to_string(),
        url: format!("https://example.com/{}", id),
        method: Some(RequestMethod::Get),
        test: test.map(String::from),
        ..Default::default()
    }
}

pub fn group(id: &str, name: &str, children: Vec<RequestEntry>) -> RequestGroup {
    RequestGroup {
        id: id.to_string(),
        name: name.to_string(),
        children,
        ..Default::default()
    }
}

/// Workbook exercising nesting, bodies, selections and workbook-level fields
pub fn sample_workbook() -> Workbook {
    let list_users = Request {
        headers: Some(vec![NameValuePair {
            name: "Accept".to_string(),
            value: "application/json".to_string(),
            disabled: None,
        }]),
        timeout: Some(5000),
        ..request("req-list", "List users", Some(STATUS_TEST))
    };

    let create_user = Request {
        method: Some(RequestMethod::Post),
        body: Some(RequestBody::JSON {
            data: json!({"name": "{{userName}}", "roles": ["admin", "*/"]}),
        }),
        selected_scenario: Some(Selection {
            id: "scenario-dev".to_string(),
            name: "Dev".to_string(),
        }),
        runs: 3,
        multi_run_execution: ExecutionConcurrency::Concurrent,
        ..request(
            "req-create",
            "Create user",
            Some("expect(response.status).to.equal(201)\n\n// it's done"),
        )
    };

    let delete_user = Request {
        method: Some(RequestMethod::Delete),
        body: Some(RequestBody::Raw {
            data: vec![0, 1, 2, 254, 255],
        }),
        keep_alive: true,
        ..request("req-delete", "Delete 'user'\nnow", None)
    };

    let users = RequestGroup {
        execution: ExecutionConcurrency::Concurrent,
        runs: 2,
        ..group(
            "group-users",
            "Users",
            vec![
                RequestEntry::Request(list_users),
                RequestEntry::Request(create_user),
                RequestEntry::Group(group(
                    "group-nested",
                    "Nested",
                    vec![RequestEntry::Request(delete_user)],
                )),
                RequestEntry::Group(group("group-empty", "Empty", vec![])),
            ],
        )
    };

    let health = request(
        "req-health",
        "Health",
        Some("  expect(response.status).to.equal(200)\n\tconst x = `a\n b`;\n"),
    );

    Workbook {
        requests: vec![RequestEntry::Group(users), RequestEntry::Request(health)],
        scenarios: vec![Scenario {
            id: "scenario-dev".to_string(),
            name: "Dev".to_string(),
            variables: Some(vec![Variable {
                name: "userName".to_string(),
                source_type: VariableSourceType::Text,
                value: "alice".to_string(),
                disabled: None,
            }]),
        }],
        ..Default::default()
    }
}
