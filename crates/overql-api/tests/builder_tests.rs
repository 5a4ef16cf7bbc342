// End-to-end builder tests with an in-memory transport

use overql::{
    difference_of, union_all, union_of, BuilderConfig, Error, IdFilter, PayloadFormat,
    QueryBuilder, QueryDate, QuerySettings, QueryStatement, RawResponse, TagFilter, Transport,
    TransportError, Verbosity,
};
use std::cell::RefCell;

/// Records every submitted program and answers with a fixed reply.
struct RecordingTransport {
    programs: RefCell<Vec<String>>,
    reply: Result<RawResponse, TransportError>,
}

impl RecordingTransport {
    fn ok(body: &str) -> Self {
        Self {
            programs: RefCell::new(Vec::new()),
            reply: Ok(RawResponse {
                status: 200,
                content_type: Some("application/osm3s+xml".to_string()),
                body: body.to_string(),
            }),
        }
    }

    fn failing(error: TransportError) -> Self {
        Self {
            programs: RefCell::new(Vec::new()),
            reply: Err(error),
        }
    }

    fn programs(&self) -> Vec<String> {
        self.programs.borrow().clone()
    }
}

impl Transport for RecordingTransport {
    fn submit(&self, program: &str) -> Result<RawResponse, TransportError> {
        self.programs.borrow_mut().push(program.to_string());
        self.reply.clone()
    }
}

fn buildings() -> QueryStatement {
    QueryStatement::node()
        .with_filter(TagFilter::has_key("building").unwrap())
        .unwrap()
}

fn primary_roads() -> QueryStatement {
    QueryStatement::way()
        .with_filter(TagFilter::equals("highway", "primary").unwrap())
        .unwrap()
}

#[test]
fn test_union_scenario_with_quadtile_sort() {
    let config = BuilderConfig::default().with_auto_descend(false);
    let mut builder = QueryBuilder::with_config(config);
    builder.append(union_of(buildings(), primary_roads())).unwrap();

    assert_eq!(
        builder.raw_query_string(),
        "(node[building];way[highway=primary];);out qt;"
    );
}

#[test]
fn test_union_scenario_with_descend() {
    let mut builder = QueryBuilder::new();
    builder.append(union_of(buildings(), primary_roads())).unwrap();

    assert_eq!(
        builder.raw_query_string(),
        "(node[building];way[highway=primary];);(._;>;);out qt;"
    );
}

#[test]
fn test_request_submits_rendered_program() {
    let transport = RecordingTransport::ok("<osm/>");
    let mut builder = QueryBuilder::new();
    builder.append(buildings()).unwrap();

    let response = builder.request(&transport).unwrap();

    assert_eq!(response.body, "<osm/>");
    assert_eq!(transport.programs(), vec!["node[building];out qt;".to_string()]);
}

#[test]
fn test_request_through_trait_object() {
    let transport: Box<dyn Transport> = Box::new(RecordingTransport::ok("{}"));
    let builder = QueryBuilder::new();
    let response = builder.request(transport.as_ref()).unwrap();
    assert!(response.is_success());
}

#[test]
fn test_request_passes_transport_errors_through() {
    let failure = TransportError::Status {
        code: 429,
        body: "rate limited".to_string(),
    };
    let transport = RecordingTransport::failing(failure.clone());
    let builder = QueryBuilder::new();

    let err = builder.request(&transport).unwrap_err();
    assert_eq!(err, Error::Transport(failure));
    assert_eq!(transport.programs().len(), 1);
}

#[test]
fn test_full_program() {
    let date = QueryDate::parse("2020-01-01T00:00:00Z").unwrap();
    let settings = QuerySettings::new()
        .with_payload_format(PayloadFormat::Json)
        .with_timeout(25)
        .with_date(date);
    let config = BuilderConfig::default()
        .with_name("stations")
        .with_settings(settings);
    let mut builder = QueryBuilder::with_config(config);

    let stations = QueryStatement::of(&[3, 1])
        .unwrap()
        .with_filter(TagFilter::any_of("railway", ["station", "halt"]).unwrap())
        .unwrap();
    builder.append(stations).unwrap();
    builder
        .output_format_mut()
        .set_verbosity(Verbosity::Verbose);
    builder.output_format_mut().set_result_limit(100).unwrap();

    assert_eq!(
        builder.raw_query_string(),
        "[out:json][timeout:25][date:2020-01-01T00:00:00Z];\
         nr[railway~\"^(station|halt)$\"];out meta qt 100;"
    );
}

#[test]
fn test_named_sets_and_difference() {
    let mut builder = QueryBuilder::new();
    builder
        .append_named(
            "cafes",
            QueryStatement::node().with_filter("[amenity=cafe]").unwrap(),
        )
        .unwrap();

    let unnamed = QueryStatement::node()
        .with_input("cafes")
        .unwrap()
        .with_filter(TagFilter::lacks_key("name").unwrap())
        .unwrap();
    let excluded = QueryStatement::node()
        .with_filter(IdFilter::many([1, 2]).unwrap())
        .unwrap();
    builder.append(difference_of(unnamed, excluded).unwrap()).unwrap();

    assert_eq!(
        builder.raw_query_string(),
        "node[amenity=cafe]->.cafes;(node.cafes[!name]; - node(id:1,2););out qt;"
    );
}

#[test]
fn test_union_all_of_many_statements() {
    let members = ["pub", "bar", "cafe"].iter().map(|amenity| {
        QueryStatement::node()
            .with_filter(TagFilter::equals("amenity", *amenity).unwrap())
            .unwrap()
    });
    let mut builder = QueryBuilder::new();
    builder.append(union_all(members).unwrap()).unwrap();

    assert_eq!(
        builder.raw_query_string(),
        "(node[amenity=pub];node[amenity=bar];node[amenity=cafe];);out qt;"
    );
}

#[test]
fn test_last_unnamed_entry_drives_descend() {
    let mut builder = QueryBuilder::new();
    builder.append(primary_roads()).unwrap();
    builder.append_named("b", buildings()).unwrap();

    // "b" is named, so the way statement is still the output
    assert_eq!(
        builder.raw_query_string(),
        "way[highway=primary];node[building]->.b;(._;>;);out qt;"
    );
}
