use crate::app_state::AppEvent;
use crate::commands::DocOwner;
use crate::document::{
    information_document_url, product_document_url, DocumentProbe, DocumentResolver, Resolution,
};
use tokio::sync::mpsc;

/// 产品与资讯文档的固定地址前缀
pub struct DocumentBases {
    pub product: String,
    pub information: String,
}

/// 解析文档地址
///
/// 公司文档需要探测大小写两个候选地址；产品和资讯附件地址是固定拼接的。
pub async fn run<P: DocumentProbe>(
    resolver: &DocumentResolver<P>,
    bases: &DocumentBases,
    owner: DocOwner,
    code: &str,
    file_name: &str,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
) {
    let resolution = match owner {
        DocOwner::Company => {
            let _ = evt_tx.send(AppEvent::Log(format!("正在探测文档地址: {}...", file_name)));
            resolver.resolve(code, file_name).await
        }
        DocOwner::Product => {
            Resolution::Primary(product_document_url(&bases.product, code, file_name))
        }
        DocOwner::Information => {
            Resolution::Primary(information_document_url(&bases.information, code, file_name))
        }
    };
    let _ = evt_tx.send(AppEvent::DocumentUrl {
        file_name: file_name.to_string(),
        resolution,
    });
}
