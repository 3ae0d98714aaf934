use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use foldersync_lib::db::models::folder_name_of;
use foldersync_lib::{
    AppState, LoggingSyncTrigger, MediaFolderType, SyncedFolder, SyncedFolderDisplayItem,
    SyncedFolderItemStore,
};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "foldersync", about = "云存储账户的同步文件夹列表")]
struct Cli {
    /// 账户名
    #[arg(long, short)]
    account: String,
    /// 数据目录（默认使用系统配置目录）
    #[arg(long)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 输出合并并排序后的文件夹列表
    List {
        /// 包含已隐藏的文件夹
        #[arg(long)]
        all: bool,
    },
    /// 启用或停用文件夹的自动上传
    Enable {
        /// 本地路径
        path: String,
        #[arg(long = "type", value_enum, default_value = "image")]
        folder_type: FolderTypeArg,
        /// 停用而不是启用
        #[arg(long)]
        off: bool,
    },
    /// 隐藏或取消隐藏文件夹
    Hide {
        path: String,
        #[arg(long = "type", value_enum, default_value = "image")]
        folder_type: FolderTypeArg,
        /// 取消隐藏
        #[arg(long)]
        off: bool,
    },
    /// 删除文件夹的同步配置
    Remove {
        path: String,
        #[arg(long = "type", value_enum, default_value = "image")]
        folder_type: FolderTypeArg,
    },
    /// 添加自定义文件夹
    AddCustom {
        path: String,
        /// 远端路径（默认为 <instantUploadPath>/<文件夹名>）
        #[arg(long)]
        remote: Option<String>,
        /// 添加后立即启用
        #[arg(long)]
        enable: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FolderTypeArg {
    Custom,
    Image,
    Video,
}

impl From<FolderTypeArg> for MediaFolderType {
    fn from(arg: FolderTypeArg) -> Self {
        match arg {
            FolderTypeArg::Custom => MediaFolderType::Custom,
            FolderTypeArg::Image => MediaFolderType::Image,
            FolderTypeArg::Video => MediaFolderType::Video,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn find(items: &SyncedFolderItemStore, path: &str, folder_type: FolderTypeArg) -> anyhow::Result<usize> {
    items
        .index_of(path, folder_type.into())
        .with_context(|| format!("未找到文件夹: {}", path))
}

async fn run(cli: Cli, state: &AppState) -> anyhow::Result<()> {
    let service = state.folder_sync_service();
    let mut items = service
        .open_item_store(&cli.account, Arc::new(LoggingSyncTrigger))
        .await?;

    match cli.command {
        Command::List { all } => {
            items.set_show_hidden(all);
            let visible: Vec<_> = items.visible_items().into_iter().map(|(_, i)| i).collect();
            print_json(&visible)?;
        }
        Command::Enable { path, folder_type, off } => {
            let index = find(&items, &path, folder_type)?;
            let item = match items.items()[index].is_enabled() == off {
                true => items.toggle_enabled(index).await?,
                false => &items.items()[index],
            };
            print_json(item)?;
        }
        Command::Hide { path, folder_type, off } => {
            let index = find(&items, &path, folder_type)?;
            let item = match items.items()[index].is_hidden() == off {
                true => items.toggle_hidden(index).await?,
                false => &items.items()[index],
            };
            print_json(item)?;
        }
        Command::Remove { path, folder_type } => {
            let index = find(&items, &path, folder_type)?;
            let removed = items.remove(index).await?;
            print_json(&removed)?;
        }
        Command::AddCustom { path, remote, enable } => {
            let name = folder_name_of(&path);
            let remote = remote.unwrap_or_else(|| {
                format!(
                    "{}/{}",
                    service.config().instant_upload_path,
                    name.as_deref().unwrap_or_default()
                )
            });
            let mut folder = SyncedFolder::new(&path, remote, &cli.account, MediaFolderType::Custom);
            if enable {
                folder.set_enabled(true, chrono::Utc::now().timestamp_millis());
            }
            let listing =
                foldersync_lib::core::list_folder_files(&path, service.config().items_per_folder);
            let item = SyncedFolderDisplayItem::new(
                folder,
                listing.file_paths,
                name,
                listing.number_of_files,
            );
            let index = items.add_custom_folder(item).await?;
            print_json(&items.items()[index])?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let state = AppState::new(cli.data_dir.clone())
        .await
        .context("初始化应用状态失败")?;
    foldersync_lib::logging::init(&state.config_dir);

    let result = run(cli, &state).await;
    state.cleanup().await;
    result
}
