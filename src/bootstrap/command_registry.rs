use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

/// 构建命令行应用 / Build the command-line interface
///
/// `server` 的参数未给出时使用配置文件中的值
/// `server` flags fall back to the configured values when omitted
pub fn build_app() -> Command {
    Command::new("notes-rust")
        .version(env!("CARGO_PKG_VERSION"))
        .about("带令牌认证的笔记 REST 服务 / Notes REST service with token auth")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("server")
                .about("启动 Web 服务器")
                .arg(
                    Arg::new("host")
                        .long("host")
                        .value_name("HOST")
                        .help("设置服务器主机地址"),
                )
                .arg(
                    Arg::new("port")
                        .short('p')
                        .long("port")
                        .value_name("PORT")
                        .help("设置服务器端口")
                        .value_parser(value_parser!(u16)),
                )
                .arg(
                    Arg::new("workers")
                        .short('w')
                        .long("workers")
                        .value_name("WORKERS")
                        .help("设置工作线程数")
                        .value_parser(value_parser!(usize)),
                )
                .arg(
                    Arg::new("debug")
                        .short('d')
                        .long("debug")
                        .help("启用调试日志 (debug 级别)")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("migrate").about("初始化数据库表结构 / Create the database schema"))
        .subcommand(Command::new("version").about("显示版本信息"))
}

/// 命令行对服务器配置的覆盖项 / Server settings overridden on the command line
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub workers: Option<usize>,
    pub debug: bool,
}

impl ServerOverrides {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            host: matches.get_one::<String>("host").cloned(),
            port: matches.get_one::<u16>("port").copied(),
            workers: matches.get_one::<usize>("workers").copied(),
            debug: matches.get_flag("debug"),
        }
    }
}

pub fn handle_version_command() {
    println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
}
