#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8 * 1024 {
        return;
    }
    let src = String::from_utf8_lossy(data);
    for dialect in [
        itl::Dialect::Standard,
        itl::Dialect::InlineExecution,
        itl::Dialect::SingleFunction,
    ] {
        let _ = itl::compile(dialect, &src, true);
        let compilation = itl::compile(dialect, &src, false);
        let Some(tree) = compilation.expression.filter(|_| !compilation.diagnostics.has_errors())
        else {
            continue;
        };

        // Clean trees must survive a render and re-parse unchanged.
        let rendered = itl::render_template(dialect, &tree);
        let reparsed = itl::compile(dialect, &rendered, false);
        assert!(!reparsed.has_errors(), "{src:?} rendered as {rendered:?}");
        assert_eq!(reparsed.expression.as_ref(), Some(&tree));
    }
});
