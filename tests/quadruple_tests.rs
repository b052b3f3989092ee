//! Shape of the generated intermediate code
//!
//! These tests pin down the quadruple layout the VM relies on: temporaries in
//! evaluation order, fully patched jumps and the call protocol.

use patito::{compile, CompiledProgram, OpCode, Operand, Value};

fn quads(program: &CompiledProgram) -> Vec<String> {
    program.quadruples.iter().map(|q| q.to_string()).collect()
}

#[test]
fn test_precedence_drives_temporary_order() {
    let program = compile(
        "program p; var a, b, c, r : int; main() { a = 1; b = 2; c = 3; r = a + b * c; } end",
    )
    .unwrap();

    let listing = quads(&program);
    let tail = &listing[listing.len() - 3..];
    assert_eq!(
        tail,
        [
            "(*, 1001, 1002, 5000)",
            "(+, 1000, 5000, 5001)",
            "(=, 5001, _, 1003)"
        ]
    );
}

#[test]
fn test_parentheses_override_precedence() {
    let program =
        compile("program p; var a, b, c, r : int; main() { r = (a + b) * c; } end").unwrap();

    assert_eq!(
        quads(&program),
        [
            "(GOTO, _, _, 1)",
            "(+, 1000, 1001, 5000)",
            "(*, 5000, 1002, 5001)",
            "(=, 5001, _, 1003)"
        ]
    );
}

#[test]
fn test_mixed_operands_use_float_temporary() {
    let program = compile("program p; var x : float; main() { x = 1 + 2.5; } end").unwrap();
    assert_eq!(
        quads(&program)[1..],
        ["(+, 7000, 8000, 6000)", "(=, 6000, _, 2000)"]
    );
}

#[test]
fn test_every_jump_is_patched_in_range() {
    let source = r#"
        program jumps;
        var i, n : int;
        int twice(v : int) [ { if (v > 10) { return v; } else { return v * 2; } } ];
        main() {
            i = 0;
            while (i < 3) do {
                if (i != 1) { n = twice(i); } else { print(i); }
                i = i + 1;
            }
        }
        end
    "#;
    let program = compile(source).unwrap();
    let len = program.quadruples.len();

    let mut jumps = 0;
    for quad in &program.quadruples {
        assert!(!quad.is_pending(), "unpatched: {}", quad);
        if quad.op.is_jump() {
            jumps += 1;
            match &quad.result {
                Some(Operand::Jump(target)) => assert!(*target <= len, "{}", quad),
                other => panic!("jump without a target: {:?}", other),
            }
        }
    }
    // main GOTO, two if/else pairs and one while pair
    assert_eq!(jumps, 7);
}

#[test]
fn test_while_loops_back_to_condition() {
    let program =
        compile("program p; var i : int; main() { i = 0; while (i < 3) do { i = i + 1; } } end")
            .unwrap();

    assert_eq!(
        quads(&program),
        [
            "(GOTO, _, _, 1)",
            "(=, 7000, _, 1000)",
            "(<, 1000, 7001, 5000)",
            "(GOTOF, 5000, _, 7)",
            "(+, 1000, 7002, 5001)",
            "(=, 5001, _, 1000)",
            "(GOTO, _, _, 2)",
        ]
    );
}

#[test]
fn test_if_without_else_jumps_past_body() {
    let program =
        compile("program p; var x : int; main() { if (x > 1) { print(x); } print(0); } end")
            .unwrap();

    assert_eq!(
        quads(&program),
        [
            "(GOTO, _, _, 1)",
            "(>, 1000, 7000, 5000)",
            "(GOTOF, 5000, _, 4)",
            "(PRINT, 1000, _, _)",
            "(PRINT, 7001, _, _)",
        ]
    );
}

#[test]
fn test_call_protocol() {
    let source = r#"
        program call;
        var r : int;
        int f(a : int, b : float) [ { return a; } ];
        main() { r = f(1, 2.0); }
        end
    "#;
    let program = compile(source).unwrap();

    assert_eq!(
        quads(&program),
        [
            "(GOTO, _, _, 4)",
            "(=, 3000, _, 1001)",
            "(ENDFUNC, _, _, _)",
            "(ENDFUNC, _, _, _)",
            "(ERA, f, _, _)",
            "(PARAM, 7000, _, 3000)",
            "(PARAM, 8000, _, 4000)",
            "(GOSUB, f, _, 1)",
            "(=, 1001, _, 5000)",
            "(=, 5000, _, 1000)",
        ]
    );

    let f = program.functions.get("f").unwrap();
    assert_eq!(f.entry, Some(1));
    assert_eq!(f.return_address.map(|a| a.to_raw()), Some(1001));
    assert_eq!(f.frame.local_int, 1);
    assert_eq!(f.frame.local_float, 1);
    assert_eq!(f.frame.total(), 2);
}

#[test]
fn test_void_call_statement_has_no_result_copy() {
    let source = r#"
        program call;
        void hello() [ { print("hi"); } ];
        main() { hello(); }
        end
    "#;
    let program = compile(source).unwrap();
    let listing = quads(&program);

    assert_eq!(listing[0], "(GOTO, _, _, 3)");
    assert_eq!(&listing[3..], ["(ERA, hello, _, _)", "(GOSUB, hello, _, 1)"]);
    assert!(program.functions.get("hello").unwrap().return_address.is_none());
}

#[test]
fn test_temporaries_restart_per_function() {
    let source = r#"
        program temps;
        var g : int;
        int f(a : int) [ var t : int; { t = a * 2; return t + 1; } ];
        main() { g = f(1) * 3; }
        end
    "#;
    let program = compile(source).unwrap();

    let f = program.functions.get("f").unwrap();
    assert_eq!(f.frame.local_int, 2);
    assert_eq!(f.frame.temp_int, 2);

    // main's first temporary reuses offset zero
    assert!(quads(&program).contains(&"(=, 1001, _, 5000)".to_string()));
}

#[test]
fn test_constants_are_deduplicated() {
    let program = compile(
        r#"program p; var x : float; main() { x = 2.5 + 2.5; print(1, 1, "s", "s", 2.5); } end"#,
    )
    .unwrap();

    assert_eq!(program.constants.len(), 3);
    let values: Vec<&Value> = program.constants.iter().map(|(_, v)| v).collect();
    assert_eq!(
        values,
        [&Value::Int(1), &Value::Float(2.5), &Value::Str("s".into())]
    );
}

#[test]
fn test_tuple_json_shape() {
    let program = compile("program p; var x : int; main() { x = 1; } end").unwrap();

    let json = serde_json::to_value(program.tuples()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([["GOTO", null, null, 1], ["=", 7000, null, 1000]])
    );
}

#[test]
fn test_program_json_artifact() {
    let source = r#"
        program artifact;
        var count : int;
        var ratio : float;
        float half(n : int) [ { return n / 2.0; } ];
        main() { ratio = half(3); print(ratio); }
        end
    "#;
    let program = compile(source).unwrap();
    let json: serde_json::Value = serde_json::from_str(&program.to_json().unwrap()).unwrap();

    assert_eq!(json["name"], "artifact");
    assert_eq!(json["globals"][0]["name"], "count");
    assert_eq!(json["globals"][0]["type"], "int");
    assert_eq!(json["globals"][0]["address"], 1000);
    assert_eq!(json["globals"][1]["address"], 2000);
    assert_eq!(json["functions"][0]["name"], "half");
    assert_eq!(json["functions"][0]["return_type"], "float");
    assert_eq!(json["constants"]["8000"], 2.0);
    assert_eq!(json["quadruples"][0], serde_json::json!(["GOTO", null, null, 5]));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = r#"
        program det;
        var a, b : int;
        int max(x : int, y : int) [ { if (x > y) { return x; } return y; } ];
        main() { a = 3; b = max(a, 9); print(b); }
        end
    "#;
    let first = compile(source).unwrap().to_json().unwrap();
    let second = compile(source).unwrap().to_json().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("\"GOSUB\""));
    assert_eq!(OpCode::Gosub.mnemonic(), "GOSUB");
}
