use markweave_core::ast::MarkdownNode;
use markweave_core::ast::ParseResult;
use markweave_core::ast::ParserOptions;
use markweave_core::theme::Theme;
use markweave_markdown::view::MarkdownInput;
use markweave_markdown::view::MarkdownView;
use markweave_markdown::view::MarkdownViewOptions;
use std::env;
use std::fs;
use std::io;
use std::io::Read;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Output {
    Text,
    Ast,
    Fragment,
}

fn main() -> io::Result<()> {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut output = Output::Text;
    let mut dark = false;
    let mut show_errors = false;
    let mut from_ast = false;
    let mut parser_options = ParserOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--ast" => output = Output::Ast,
            "--fragment" => output = Output::Fragment,
            "--from-ast" => from_ast = true,
            "--dark" => dark = true,
            "--show-errors" => show_errors = true,
            "--no-gfm" => parser_options.gfm = false,
            "--math" => parser_options.math = true,
            _ => break,
        }
        i += 1;
    }

    let input = if i < args.len() {
        fs::read_to_string(&args[i])?
    } else {
        let mut s = String::new();
        io::stdin().read_to_string(&mut s)?;
        s
    };

    let theme = if dark { Theme::dark() } else { Theme::light() };
    let view = MarkdownView::new().with_theme(theme).with_options(
        MarkdownViewOptions::default()
            .with_parser_options(parser_options)
            .with_show_errors(show_errors),
    );

    let nodes: Vec<MarkdownNode> = if from_ast {
        ParseResult::from_json(&input)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?
            .into_result()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.message))?
    } else {
        match view.parse(&input).into_result() {
            Ok(nodes) => nodes,
            Err(err) if !show_errors => {
                return Err(io::Error::new(io::ErrorKind::InvalidData, err.message));
            }
            Err(_) => {
                print_text(&view, MarkdownInput::Source(&input));
                return Ok(());
            }
        }
    };

    match output {
        Output::Ast => {
            let json = serde_json::to_string_pretty(&nodes).map_err(io::Error::other)?;
            println!("{json}");
        }
        Output::Fragment => println!("{:#?}", view.render_ast(&nodes, None)),
        Output::Text => print_text(&view, MarkdownInput::Ast(&nodes)),
    }
    Ok(())
}

fn print_text(view: &MarkdownView, input: MarkdownInput<'_>) {
    for line in view.render_text(input, None).plain_lines() {
        println!("{}", line.trim_end());
    }
}

fn print_help() {
    eprintln!(
        "Usage: dump [options] [path]\n\
\n\
Options:\n\
  --ast            Print the parsed AST as JSON\n\
  --fragment       Print the rendered fragment tree\n\
  --from-ast       Treat the input as a JSON node array instead of markdown\n\
  --dark           Use the dark theme\n\
  --show-errors    Render parse errors instead of failing\n\
  --no-gfm         Disable GitHub-flavored extensions\n\
  --math           Enable math spans\n\
  -h, --help       Show this help\n\
\n\
If [path] is omitted, reads from stdin."
    );
}
