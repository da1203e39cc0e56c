/// 接口业务错误码，序列化为 `ApiResponse.code`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InternalServerError = 1005,

    // 认证错误
    AuthFailed = 2000,
    SessionExpired = 2001,

    // 导入错误
    ImportFileEmpty = 3000,
    ImportFileMissingColumn = 3001,
    ImportFileInvalidClass = 3002,
    ImportFileClassCountExceeded = 3003,
    ImportFileReadFailed = 3004,
    ImportFileTooLarge = 3005,

    // 存储错误
    StorageDataCorrupted = 4000,
    StorageUnavailable = 4001,
}
