//! Wire-grammar and mode-interpretation tests over the public API.

use slirc_client::{mode, Command, Ctcp, Isupport, Message, ModeTarget, Response};

#[test]
fn test_full_line_grammar() {
    let msg = Message::parse(
        "@time=2024-05-01T10:00:00Z :alice!ali@example.net PRIVMSG #rust :has anyone tried nom?",
    )
    .unwrap();
    assert_eq!(msg.tags.as_deref(), Some("time=2024-05-01T10:00:00Z"));
    assert_eq!(msg.prefix.as_deref(), Some("alice!ali@example.net"));
    assert_eq!(
        msg.command,
        Command::PRIVMSG("#rust".to_string(), "has anyone tried nom?".to_string())
    );
}

#[test]
fn test_colon_inside_trailing() {
    let msg = Message::parse(":n!u@h PRIVMSG #ch :see https://example.net:8080/x").unwrap();
    assert_eq!(
        msg.command,
        Command::PRIVMSG(
            "#ch".to_string(),
            "see https://example.net:8080/x".to_string()
        )
    );
}

#[test]
fn test_numeric_with_many_params() {
    let msg = Message::parse(":srv 352 me #ch ident host srv nick H :0 Real Name").unwrap();
    match msg.command {
        Command::Response(Response::RPL_WHOREPLY, params) => {
            assert_eq!(params.len(), 8);
            assert_eq!(params[7], "0 Real Name");
        }
        other => panic!("expected WHO reply, got {:?}", other),
    }
}

#[test]
fn test_ctcp_inside_parsed_privmsg() {
    let msg = Message::parse(":a!b@c PRIVMSG me :\u{1}PING 1700000000\u{1}").unwrap();
    let Command::PRIVMSG(_, text) = msg.command else {
        panic!("expected PRIVMSG");
    };
    let ctcp = Ctcp::parse(&text).unwrap();
    assert_eq!(ctcp.command, "PING");
    assert_eq!(ctcp.arg, "1700000000");
}

#[test]
fn test_mode_interpretation_follows_isupport() {
    // An UnrealIRCd-flavoured table: 'h' is a prefix mode, 'f' takes a
    // parameter only when set.
    let mut table = Isupport::default();
    table.apply_tokens(&["PREFIX=(ohv)@%+", "CHANMODES=beI,kL,lf,imnpst"]);

    let ops = mode::interpret(
        &table,
        "+hf-l+b",
        &["alice", "[5t]:10", "*!spam@*"],
    );
    let decoded: Vec<(bool, char, Option<String>)> = ops
        .iter()
        .map(|op| (op.adding, op.flag, op.target.as_ref().map(|t| t.to_string())))
        .collect();
    assert_eq!(
        decoded,
        vec![
            (true, 'h', Some("alice".to_string())),
            (true, 'f', Some("[5t]:10".to_string())),
            (false, 'l', None),
            (true, 'b', Some("*!spam@*".to_string())),
        ]
    );

    // The ban mask came back structured, not as an opaque string.
    assert!(matches!(ops[3].target, Some(ModeTarget::User(_))));
}

#[test]
fn test_mode_interpretation_same_line_different_tables() {
    // Identical wire line, different dialects: with 'h' unknown it
    // consumes nothing and the parameter shifts to the next flag.
    let line = Message::parse(":op!o@h MODE #ch +hk sekrit").unwrap();
    let Command::MODE(_, modes, params) = line.command else {
        panic!("expected MODE");
    };
    let params: Vec<&str> = params.iter().map(String::as_str).collect();

    let rfc1459 = Isupport::default();
    let ops = mode::interpret(&rfc1459, &modes, &params);
    assert_eq!(ops[0].flag, 'h');
    assert_eq!(ops[0].target, None);
    assert_eq!(ops[1].target, Some(ModeTarget::Arg("sekrit".to_string())));

    let mut halfop = Isupport::default();
    halfop.apply_tokens(&["PREFIX=(ohv)@%+"]);
    let ops = mode::interpret(&halfop, &modes, &params);
    assert_eq!(ops[0].target, Some(ModeTarget::Arg("sekrit".to_string())));
    // 'k' is left with nothing and is dropped.
    assert_eq!(ops.len(), 1);
}
