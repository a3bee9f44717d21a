use super::*;

#[test]
fn params_parse_from_key_value_pairs() {
    let params = parse_params(&["message=hi there".into(), "n=3".into()]).expect("params");
    assert_eq!(params.get::<String>("message").expect("message").as_deref(), Some("hi there"));
    assert_eq!(params.get::<u8>("n").expect("n"), Some(3));
}

#[test]
fn malformed_params_are_rejected() {
    assert!(parse_params(&["novalue".into()]).is_err());
    assert!(parse_params(&["=x".into()]).is_err());
}

#[test]
fn hello_echoes_the_message() {
    let app = console_application(console_config()).expect("app");
    let params = parse_params(&["message=ahoy".into()]).expect("params");
    let output = app.handle_request("hello", &params).expect("run");
    assert_eq!(format_output(output).as_deref(), Some("ahoy"));
}

#[test]
fn empty_route_shows_help() {
    let app = console_application(console_config()).expect("app");
    let output = app.handle_request("", &Params::new()).expect("run");
    assert_eq!(
        output,
        Some(json!({ "application": "console", "routes": ["hello/index", "help/index"] }))
    );
}

#[test]
fn unknown_console_route_fails() {
    let app = console_application(console_config()).expect("app");
    let err = app
        .handle_request("migrate/up", &Params::new())
        .expect_err("unknown");
    assert_eq!(err.to_string(), "Unable to resolve the request \"migrate/up\".");
}

#[test]
fn cli_accepts_repeated_params() {
    let cli = Cli::try_parse_from(["tools", "run", "hello", "-p", "message=x", "--param", "y=1"])
        .expect("cli");
    match cli.command {
        Command::Run { route, params } => {
            assert_eq!(route, "hello");
            assert_eq!(params, ["message=x", "y=1"]);
        }
        Command::Routes => panic!("expected run"),
    }
}
