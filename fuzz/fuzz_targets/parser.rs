#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Templates are short command lines; keep the harness from spending time on huge inputs.
    if data.len() > 16 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    let len = src.chars().count();
    for dialect in [
        itl::Dialect::Standard,
        itl::Dialect::InlineExecution,
        itl::Dialect::SingleFunction,
    ] {
        let lexed = itl::lex(dialect, &src);
        for token in &lexed.tokens {
            assert!(token.position <= token.end_position && token.end_position <= len);
        }
        let mut diagnostics = itl::Diagnostics::new();
        let _ = itl::parse_tokens(&lexed.tokens, &mut diagnostics, len, false);
        for diagnostic in &diagnostics {
            if let Some(span) = diagnostic.span {
                assert!(span.end() <= len);
            }
        }
    }
});
